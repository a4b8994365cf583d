//! Session history
//!
//! The runtime records visited urls through a pluggable backend. The
//! default keeps real urls; `HashHistory` encodes each visit into the
//! fragment of a fixed base, for hosts that cannot rewrite the address.

use url::Url;

/// Where visited urls are recorded.
pub trait HistoryBackend {
    /// Append an entry, discarding any forward entries.
    fn push(&mut self, url: &Url);
    /// Replace the current entry in place.
    fn replace(&mut self, url: &Url);
    /// The url of the current entry, if any.
    fn current(&self) -> Option<Url>;
    /// Step back one entry, returning the new current url.
    fn back(&mut self) -> Option<Url>;
    /// Step forward one entry, returning the new current url.
    fn forward(&mut self) -> Option<Url>;
    /// The address the host should display for the current entry.
    fn address(&self) -> Option<Url> {
        self.current()
    }
    /// Recover the real url from the address the host reports on a
    /// history pop. Identity for backends whose addresses are real urls.
    fn resolve_pop(&self, reported: &Url) -> Url {
        reported.clone()
    }
}

/// In-memory history of real urls.
#[derive(Default)]
pub struct NativeHistory {
    entries: Vec<Url>,
    index: usize,
}

impl HistoryBackend for NativeHistory {
    fn push(&mut self, url: &Url) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(url.clone());
        self.index = self.entries.len() - 1;
    }

    fn replace(&mut self, url: &Url) {
        if self.entries.is_empty() {
            self.entries.push(url.clone());
            self.index = 0;
        } else {
            self.entries[self.index] = url.clone();
        }
    }

    fn current(&self) -> Option<Url> {
        self.entries.get(self.index).cloned()
    }

    fn back(&mut self) -> Option<Url> {
        if self.index == 0 || self.entries.is_empty() {
            return None;
        }
        self.index -= 1;
        self.current()
    }

    fn forward(&mut self) -> Option<Url> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.current()
    }
}

/// History that never leaves its base address: each visit is stored in
/// the fragment, so the host address bar reads `base#/path?query`.
pub struct HashHistory {
    base: Url,
    inner: NativeHistory,
}

impl HashHistory {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            inner: NativeHistory::default(),
        }
    }

    fn encode(&self, url: &Url) -> Url {
        let mut fragment = url.path().to_string();
        if let Some(q) = url.query() {
            fragment.push('?');
            fragment.push_str(q);
        }
        let mut out = self.base.clone();
        out.set_fragment(Some(&fragment));
        out
    }
}

impl HistoryBackend for HashHistory {
    fn push(&mut self, url: &Url) {
        self.inner.push(url);
    }

    fn replace(&mut self, url: &Url) {
        self.inner.replace(url);
    }

    fn current(&self) -> Option<Url> {
        self.inner.current()
    }

    fn back(&mut self) -> Option<Url> {
        self.inner.back()
    }

    fn forward(&mut self) -> Option<Url> {
        self.inner.forward()
    }

    fn address(&self) -> Option<Url> {
        self.inner.current().map(|u| self.encode(&u))
    }

    fn resolve_pop(&self, reported: &Url) -> Url {
        match reported.fragment().filter(|f| !f.is_empty()) {
            Some(fragment) => self
                .base
                .join(fragment)
                .unwrap_or_else(|_| reported.clone()),
            None => self.base.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut h = NativeHistory::default();
        h.push(&u("http://x/a"));
        h.push(&u("http://x/b"));
        h.push(&u("http://x/c"));
        assert_eq!(h.back(), Some(u("http://x/b")));
        h.push(&u("http://x/d"));
        assert_eq!(h.forward(), None);
        assert_eq!(h.back(), Some(u("http://x/b")));
        assert_eq!(h.back(), Some(u("http://x/a")));
        assert_eq!(h.back(), None);
    }

    #[test]
    fn test_replace_keeps_depth() {
        let mut h = NativeHistory::default();
        h.replace(&u("http://x/start"));
        h.push(&u("http://x/next"));
        h.replace(&u("http://x/next2"));
        assert_eq!(h.current(), Some(u("http://x/next2")));
        assert_eq!(h.back(), Some(u("http://x/start")));
    }

    #[test]
    fn test_hash_history_address() {
        let mut h = HashHistory::new(u("http://host/app"));
        h.push(&u("http://host/items?page=2"));
        assert_eq!(h.address(), Some(u("http://host/app#/items?page=2")));
        assert_eq!(h.current(), Some(u("http://host/items?page=2")));
    }

    #[test]
    fn test_resolve_pop_decodes_fragment() {
        let h = HashHistory::new(u("http://host/app"));
        assert_eq!(
            h.resolve_pop(&u("http://host/app#/items?page=2")),
            u("http://host/items?page=2")
        );
        // A bare address without a fragment means the base itself.
        assert_eq!(h.resolve_pop(&u("http://host/app")), u("http://host/app"));

        let native = NativeHistory::default();
        assert_eq!(
            native.resolve_pop(&u("http://host/items?page=2")),
            u("http://host/items?page=2")
        );
    }
}
