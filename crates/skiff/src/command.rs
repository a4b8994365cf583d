//! Effect commands
//!
//! The runtime never performs I/O itself; each side effect the app wants
//! is recorded as a `Command` the host drains and executes.

use url::Url;

use skiff_dom::NodeId;

use crate::fetch::FetchId;

/// A side effect requested by the runtime, to be executed by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch a document over the network; report back with
    /// `App::finish_fetch` using the same id.
    FetchDocument { id: FetchId, url: Url },
    /// Load and execute an external script; report completion with
    /// `App::finish_script`.
    LoadScript { url: String },
    /// Load an external stylesheet. Fire and forget.
    LoadStylesheet { url: String },
    /// Move input focus to the given element.
    Focus { node: NodeId },
    /// Scroll the viewport back to the top of the page.
    ScrollToTop,
}
