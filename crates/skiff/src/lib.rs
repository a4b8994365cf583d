//! Skiff - a headless page-application runtime
//!
//! Skiff binds stateful controllers to DOM elements by selector, routes
//! three kinds of messages between them (global publish/subscribe plus
//! tree-scoped up/down messaging), and performs fetch-and-swap page
//! navigation with script/style dedup and history tracking.
//!
//! The runtime is single-threaded and sans-IO: real network and focus
//! side effects are emitted as [`Command`]s for the host to perform, and
//! results flow back through [`App::finish_fetch`] and friends.

mod app;
mod binding;
mod command;
mod controller;
mod emitter;
mod error;
mod fetch;
mod history;
mod navigate;
mod resources;
mod router;
mod scan;
mod tags;

pub use app::{App, Context, HandlerFailure};
pub use binding::BindingId;
pub use command::Command;
pub use controller::{ControllerId, ControllerSpec, ControllerSpecBuilder, Msg};
pub use emitter::ListenerId;
pub use error::{BindError, HandlerError, NavError};
pub use fetch::{FetchId, RawResponse};
pub use history::{HashHistory, HistoryBackend, NativeHistory};
pub use navigate::{NavCallback, NavPhase, NavigateOptions};
pub use resources::ResourceRegistry;

pub use skiff_dom::{serialize, Document, DomTree, NodeId};

/// Structural marker class added to every element the scanner has tagged
pub const TAG_CLASS: &str = "skiff-bound";
