//! Application runtime
//!
//! `App` owns the live document, the binding and tag tables, the
//! resource registry and the session history, and hands controllers a
//! borrowed [`Context`] for the duration of each handler call.

use serde_json::Value;
use url::Url;

use skiff_css::Selector;
use skiff_dom::{Document, NodeId};
use skiff_html::parse_document;

use crate::binding::{BindingId, BindingTable};
use crate::command::Command;
use crate::controller::{ControllerId, ControllerSpec, Msg};
use crate::emitter::{Emitter, ListenerId};
use crate::error::{BindError, HandlerError, NavError};
use crate::fetch::DocumentFetcher;
use crate::history::{HistoryBackend, NativeHistory};
use crate::navigate::{NavPhase, PendingNav};
use crate::resources::ResourceRegistry;
use crate::tags::{Slot, TagTable};

/// A controller callback that returned an error. Failures are isolated:
/// the offending callback is abandoned, everything else proceeds.
#[derive(Debug, Clone)]
pub struct HandlerFailure {
    pub controller: ControllerId,
    /// Message kind that was being delivered
    pub kind: String,
    pub error: HandlerError,
}

/// The page-application runtime.
pub struct App {
    pub(crate) doc: Document,
    pub(crate) base_url: Url,
    pub(crate) bindings: BindingTable,
    pub(crate) tags: TagTable,
    pub(crate) resources: ResourceRegistry,
    pub(crate) fetcher: DocumentFetcher,
    pub(crate) pending_nav: Option<PendingNav>,
    pub(crate) phase: NavPhase,
    pub(crate) history: Box<dyn HistoryBackend>,
    pub(crate) emitter: Emitter,
    pub(crate) commands: std::collections::VecDeque<Command>,
    pub(crate) failures: Vec<HandlerFailure>,
    pub(crate) started: bool,
    pub(crate) pop_armed: bool,
}

impl App {
    /// Create an app over a blank document at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, NavError> {
        let url = Url::parse(base_url).map_err(|source| NavError::Url {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self::with_document(Document::new(url.as_str()), url))
    }

    /// Create an app over a parsed document.
    pub fn from_html(html: &str, base_url: &str) -> Result<Self, NavError> {
        let url = Url::parse(base_url).map_err(|source| NavError::Url {
            url: base_url.to_string(),
            source,
        })?;
        let doc = parse_document(html, url.as_str())?;
        Ok(Self::with_document(doc, url))
    }

    fn with_document(doc: Document, base_url: Url) -> Self {
        Self {
            doc,
            base_url,
            bindings: BindingTable::default(),
            tags: TagTable::default(),
            resources: ResourceRegistry::default(),
            fetcher: DocumentFetcher::default(),
            pending_nav: None,
            phase: NavPhase::Idle,
            history: Box::new(NativeHistory::default()),
            emitter: Emitter::default(),
            commands: std::collections::VecDeque::new(),
            failures: Vec::new(),
            started: false,
            pop_armed: false,
        }
    }

    /// Swap in a different history backend. Call before `start`.
    pub fn with_history(mut self, history: impl HistoryBackend + 'static) -> Self {
        self.history = Box::new(history);
        self
    }

    /// Bring the app up: record the initial page's assets, seed the
    /// history with the current url, run the first scan, and start
    /// honoring history pops. Idempotent.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.resources.seed(&self.doc);
        if self.history.current().is_none() {
            self.history.replace(&self.base_url);
        }
        self.scan();
        // Pops reported before this point are the host's own startup
        // noise and are ignored.
        self.pop_armed = true;
        tracing::debug!(url = %self.base_url, "app started");
    }

    /// Register a controller binding. When the app is already started
    /// the new binding is applied to the current document immediately.
    pub fn bind(&mut self, selector: &str, spec: ControllerSpec) -> Result<BindingId, BindError> {
        let selector = Selector::parse(selector)?;
        tracing::debug!(selector = selector.source(), "bind");
        let id = self.bindings.push(selector, spec);
        if self.started {
            self.scan_binding(id);
        }
        Ok(id)
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The address the host should display, per the history backend.
    pub fn address(&self) -> Option<Url> {
        self.history.address()
    }

    /// Drain the side effects requested since the last call.
    pub fn take_commands(&mut self) -> Vec<Command> {
        self.commands.drain(..).collect()
    }

    /// Drain the handler failures recorded since the last call.
    pub fn take_failures(&mut self) -> Vec<HandlerFailure> {
        std::mem::take(&mut self.failures)
    }

    pub fn nav_phase(&self) -> NavPhase {
        self.phase
    }

    // Runtime event emitter.

    pub fn on(&mut self, name: &str, f: impl FnMut(&[Value]) + 'static) -> ListenerId {
        self.emitter.on(name, Box::new(f))
    }

    pub fn once(&mut self, name: &str, f: impl FnMut(&[Value]) + 'static) -> ListenerId {
        self.emitter.once(name, Box::new(f))
    }

    pub fn off(&mut self, name: &str, id: ListenerId) {
        self.emitter.off(name, id);
    }

    pub fn emit(&mut self, name: &str, args: &[Value]) {
        self.emitter.emit(name, args);
    }

    /// Publish a message to every subscribed controller, in document
    /// order of their elements.
    pub fn publish(&mut self, name: &str, args: Vec<Value>) {
        self.publish_from(None, name, args);
    }

    /// Report completion of a `Command::LoadScript`. Dedup state is not
    /// rolled back on failure; a bad asset is not re-requested.
    pub fn finish_script(&mut self, url: &str, ok: bool) {
        if !ok {
            tracing::warn!(url, "script failed to load");
            self.emit("resource-error", &[serde_json::json!(url)]);
        }
    }

    /// Reclaim controller instances whose elements are no longer
    /// attached, running their `unmount` handlers. Elements with a
    /// handler currently on the stack are left for a later sweep.
    pub fn sweep(&mut self) {
        let mut dead: Vec<NodeId> = self
            .tags
            .elements()
            .into_iter()
            .filter(|&el| !self.doc.tree().is_attached(el) && !self.tags.has_checked_out(el))
            .collect();
        dead.sort_by_key(|el| el.to_raw());

        for el in dead {
            let Some(mut slots) = self.tags.remove(el) else {
                continue;
            };
            for binding in self.bindings.ids() {
                let Some(Slot::Occupied(mut instance)) = slots.remove(&binding) else {
                    continue;
                };
                let id = ControllerId { el, binding };
                let msg = Msg::lifecycle("unmount");
                for handler_id in instance.spec.unmount_handlers() {
                    let handler = instance.spec.handler(handler_id);
                    let mut cx = Context { app: self, el, id };
                    if let Err(error) = handler(instance.state.as_mut(), &mut cx, &msg) {
                        tracing::error!(%error, "unmount handler failed");
                        self.failures.push(HandlerFailure {
                            controller: id,
                            kind: msg.kind.clone(),
                            error,
                        });
                    }
                }
            }
        }
    }
}

/// What a controller callback sees: its element, its identity, and the
/// whole app for publishing, navigating and DOM access.
pub struct Context<'a> {
    pub(crate) app: &'a mut App,
    pub(crate) el: NodeId,
    pub(crate) id: ControllerId,
}

impl Context<'_> {
    /// The element this controller instance is bound to
    pub fn el(&self) -> NodeId {
        self.el
    }

    pub fn controller(&self) -> ControllerId {
        self.id
    }

    pub fn app(&mut self) -> &mut App {
        self.app
    }

    pub fn doc(&self) -> &Document {
        &self.app.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.app.doc
    }

    /// Publish a message carrying this controller as its source.
    pub fn publish(&mut self, name: &str, args: Vec<Value>) {
        let source = self.id;
        self.app.publish_from(Some(source), name, args);
    }

    /// Send a message to ancestor controllers, nearest first.
    pub fn up(&mut self, name: &str, args: Vec<Value>) {
        let (el, source) = (self.el, self.id);
        self.app.send_up(el, Some(source), name, args);
    }

    /// Send a message to descendant controllers, in document order.
    pub fn down(&mut self, name: &str, args: Vec<Value>) {
        let (el, source) = (self.el, self.id);
        self.app.send_down(el, Some(source), name, args);
    }

    /// Re-run binding over the subtree below this element, e.g. after
    /// the handler inserted new markup.
    pub fn rescan(&mut self) {
        let el = self.el;
        self.app.scan_from(el);
    }

    /// Navigate, resolved against the current base url.
    pub fn navigate(&mut self, target: &str) -> Result<crate::FetchId, crate::NavError> {
        self.app.navigate(target)
    }
}
