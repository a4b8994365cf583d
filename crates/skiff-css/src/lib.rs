//! Skiff CSS - selector parsing and matching
//!
//! Supports the selector subset the binder needs: type, id, class and
//! attribute simple selectors, descendant and child combinators, and
//! comma-separated lists. Selector syntax errors are configuration
//! errors and surface at registration time.

mod selectors;

pub use selectors::{
    AttributeMatcher, AttributeSelector, Combinator, Compound, Selector, SelectorError,
};
