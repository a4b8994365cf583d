//! Document fetches
//!
//! Tracks the single in-flight document request. A new fetch supersedes
//! the previous one; a completion for a superseded id is simply stale.

/// Identifies one document fetch issued via `Command::FetchDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchId(u64);

/// The raw result of a document fetch, as produced by the host.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Default)]
pub(crate) struct DocumentFetcher {
    current: Option<FetchId>,
    next: u64,
}

impl DocumentFetcher {
    /// Start a new fetch, superseding any in-flight one.
    pub fn begin(&mut self) -> FetchId {
        let id = FetchId(self.next);
        self.next += 1;
        self.current = Some(id);
        id
    }

    /// Whether this completion is for the live fetch. Clears the
    /// in-flight marker when it is.
    pub fn complete(&mut self, id: FetchId) -> bool {
        if self.current == Some(id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn abort(&mut self) {
        self.current = None;
    }
}
