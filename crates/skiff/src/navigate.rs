//! Fetch-and-swap navigation
//!
//! `navigate` resolves the target against the base url and issues a
//! `Command::FetchDocument`; the host reports back through
//! `finish_fetch`. A later navigation supersedes an in-flight one, and
//! the superseded completion is dropped without touching the document.
//! Nothing in the live document changes until the response has passed
//! the status gate and parsed.

use serde_json::json;
use url::Url;

use skiff_dom::NodeId;

use crate::app::App;
use crate::command::Command;
use crate::error::NavError;
use crate::fetch::{FetchId, RawResponse};

/// Per-navigation tweaks.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct NavigateOptions {
    /// Leave the scroll position alone after the swap.
    pub no_scroll_to_top: bool,
}

/// Invoked once when the navigation settles (applied, failed, but not
/// when superseded).
pub type NavCallback = Box<dyn FnOnce(&mut App, Result<(), NavError>)>;

/// Where the runtime is in the navigation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPhase {
    Idle,
    Fetching,
    SyncingResources,
    SwappingDom,
    Rescanning,
    /// The fetch or swap failed. Set before the caller's callback runs,
    /// cleared back to `Idle` afterwards.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NavKind {
    /// Forward navigation; pushes a history entry.
    Visit,
    /// History traversal; the backend has already moved.
    Revisit,
}

pub(crate) struct PendingNav {
    pub id: FetchId,
    pub url: Url,
    pub kind: NavKind,
    pub no_scroll: bool,
    pub callback: Option<NavCallback>,
}

impl App {
    /// Navigate to `target`, resolved against the current base url.
    pub fn navigate(&mut self, target: &str) -> Result<FetchId, NavError> {
        self.navigate_with(target, NavigateOptions::default(), None)
    }

    pub fn navigate_with(
        &mut self,
        target: &str,
        options: NavigateOptions,
        callback: Option<NavCallback>,
    ) -> Result<FetchId, NavError> {
        let url = self.base_url.join(target).map_err(|source| NavError::Url {
            url: target.to_string(),
            source,
        })?;
        Ok(self.begin_visit(url, NavKind::Visit, options.no_scroll_to_top, callback))
    }

    /// Navigate back one history entry, refetching that page. Returns
    /// `None` when there is nothing to go back to.
    pub fn go_back(&mut self) -> Option<FetchId> {
        let url = self.history.back()?;
        self.emit("revisit-start", &[json!(url.as_str())]);
        Some(self.begin_visit(url, NavKind::Revisit, false, None))
    }

    /// Handle a history pop reported by the host. Pops arriving before
    /// `start` completes are ignored; some hosts fire one spuriously on
    /// load. Returns the fetch id of the revisit, if one began.
    pub fn on_pop(&mut self, url: &str) -> Result<Option<FetchId>, NavError> {
        if !self.pop_armed {
            tracing::debug!(url, "ignoring pop before start");
            return Ok(None);
        }
        let url = Url::parse(url).map_err(|source| NavError::Url {
            url: url.to_string(),
            source,
        })?;
        let url = self.history.resolve_pop(&url);
        self.history.replace(&url);
        self.emit("revisit-start", &[json!(url.as_str())]);
        Ok(Some(self.begin_visit(url, NavKind::Revisit, false, None)))
    }

    fn begin_visit(
        &mut self,
        url: Url,
        kind: NavKind,
        no_scroll: bool,
        callback: Option<NavCallback>,
    ) -> FetchId {
        if let Some(prior) = self.pending_nav.take() {
            self.fetcher.abort();
            tracing::debug!(url = %prior.url, "navigation superseded");
        }
        let id = self.fetcher.begin();
        self.phase = NavPhase::Fetching;
        self.pending_nav = Some(PendingNav {
            id,
            url: url.clone(),
            kind,
            no_scroll,
            callback,
        });
        self.commands.push_back(Command::FetchDocument { id, url });
        id
    }

    /// Feed back the result of a `Command::FetchDocument`. Stale ids
    /// (from superseded navigations) are dropped silently.
    pub fn finish_fetch(&mut self, id: FetchId, result: Result<RawResponse, String>) {
        if !self.fetcher.complete(id) {
            tracing::debug!("stale fetch completion");
            return;
        }
        let Some(pending) = self.pending_nav.take() else {
            return;
        };
        if pending.id != id {
            self.pending_nav = Some(pending);
            return;
        }

        let outcome = match result {
            Err(e) => Err(NavError::Request(e)),
            Ok(response) => self.apply_navigation(&pending, response),
        };
        self.phase = if outcome.is_ok() {
            NavPhase::Idle
        } else {
            NavPhase::Error
        };

        if let Err(error) = &outcome {
            tracing::warn!(url = %pending.url, %error, "navigation failed");
        }
        if pending.kind == NavKind::Revisit {
            self.emit("revisit-end", &[json!(pending.url.as_str())]);
        }
        if let Some(callback) = pending.callback {
            callback(self, outcome);
        }
        // A callback may have started a fresh navigation; only a phase
        // still parked at Error goes back to Idle.
        if self.phase == NavPhase::Error {
            self.phase = NavPhase::Idle;
        }
    }

    fn apply_navigation(
        &mut self,
        pending: &PendingNav,
        response: RawResponse,
    ) -> Result<(), NavError> {
        if !(200..300).contains(&response.status) {
            return Err(NavError::HttpStatus(response.status));
        }
        let mut incoming = skiff_html::parse_document(&response.body, pending.url.as_str())?;

        // Past this point the swap cannot fail.
        self.phase = NavPhase::SyncingResources;
        self.resources
            .sync(&mut incoming, &mut self.doc, &mut self.commands);

        self.phase = NavPhase::SwappingDom;
        let title = incoming.title();
        let old_body = self.doc.body();
        let new_body = self.doc.tree_mut().adopt(incoming.tree(), incoming.body());
        self.doc.tree_mut().detach(old_body);
        let html = self.doc.document_element();
        self.doc.tree_mut().append_child(html, new_body);
        self.doc.set_body(new_body);
        self.doc.set_title(&title);
        self.doc.set_url(pending.url.as_str());
        self.base_url = pending.url.clone();

        self.emit(
            "body-change",
            &[json!(old_body.to_raw()), json!(new_body.to_raw())],
        );

        if let Some(target) = self.find_autofocus(new_body) {
            self.commands.push_back(Command::Focus { node: target });
        }
        if !pending.no_scroll {
            self.commands.push_back(Command::ScrollToTop);
        }

        self.phase = NavPhase::Rescanning;
        self.scan();

        if pending.kind == NavKind::Visit {
            self.history.push(&pending.url);
        }
        tracing::debug!(url = %pending.url, "navigation applied");
        Ok(())
    }

    fn find_autofocus(&self, body: NodeId) -> Option<NodeId> {
        self.doc
            .tree()
            .descendants(body)
            .find(|&n| self.doc.tree().attr(n, "autofocus").is_some())
    }
}
