//! App-level event emitter
//!
//! A small name-keyed listener registry for runtime events such as
//! `revisit-start`, `revisit-end` and `body-change`. Listeners take the
//! event's arguments as JSON values.

use std::collections::HashMap;

use serde_json::Value;

/// Handle returned by `on`/`once`, used to remove a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    once: bool,
    f: Box<dyn FnMut(&[Value])>,
}

#[derive(Default)]
pub(crate) struct Emitter {
    listeners: HashMap<String, Vec<Listener>>,
    next: u64,
}

impl Emitter {
    fn add(&mut self, name: &str, once: bool, f: Box<dyn FnMut(&[Value])>) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.listeners
            .entry(name.to_owned())
            .or_default()
            .push(Listener { id, once, f });
        id
    }

    pub fn on(&mut self, name: &str, f: Box<dyn FnMut(&[Value])>) -> ListenerId {
        self.add(name, false, f)
    }

    pub fn once(&mut self, name: &str, f: Box<dyn FnMut(&[Value])>) -> ListenerId {
        self.add(name, true, f)
    }

    pub fn off(&mut self, name: &str, id: ListenerId) {
        if let Some(list) = self.listeners.get_mut(name) {
            list.retain(|l| l.id != id);
        }
    }

    /// Invoke every listener registered for `name`, dropping one-shot
    /// listeners afterwards.
    pub fn emit(&mut self, name: &str, args: &[Value]) {
        let Some(mut list) = self.listeners.remove(name) else {
            return;
        };
        for l in &mut list {
            (l.f)(args);
        }
        list.retain(|l| !l.once);
        // Listeners added from within a callback land in the map entry
        // we removed above; merge rather than clobber.
        match self.listeners.get_mut(name) {
            Some(existing) => {
                list.append(existing);
                *existing = list;
            }
            None => {
                if !list.is_empty() {
                    self.listeners.insert(name.to_owned(), list);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_once_fires_single_time() {
        let mut e = Emitter::default();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        e.once("x", Box::new(move |_| h.set(h.get() + 1)));
        e.emit("x", &[]);
        e.emit("x", &[]);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_off_removes_listener() {
        let mut e = Emitter::default();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = e.on("x", Box::new(move |_| h.set(h.get() + 1)));
        e.emit("x", &[]);
        e.off("x", id);
        e.emit("x", &[]);
        assert_eq!(hits.get(), 1);
    }
}
