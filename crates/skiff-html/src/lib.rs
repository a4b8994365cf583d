//! Skiff HTML - tolerant parsing with progressive fallback
//!
//! Parsing attempts an ordered list of strategies and exposes one
//! uniform `Document` regardless of which succeeded:
//!
//! 1. `Strict` - requires an explicit `<html>` element and balanced tags
//! 2. `Lenient` - tag-soup recovery (auto-close, ignore strays), but
//!    still requires some markup
//! 3. `Fragment` - treats the input as body content and wraps it
//!
//! Only if every strategy fails does parsing surface a fatal error.

mod parser;

pub use parser::{parse_with, ParseError, Strategy};

use skiff_dom::Document;

/// Ordered strategy preference
const STRATEGIES: &[Strategy] = &[Strategy::Strict, Strategy::Lenient, Strategy::Fragment];

/// Parse an HTML document, trying each strategy in order
pub fn parse_document(html: &str, url: &str) -> Result<Document, ParseError> {
    let mut last_err = ParseError::EmptyInput;
    for &strategy in STRATEGIES {
        match parse_with(html, url, strategy) {
            Ok(doc) => {
                tracing::debug!(?strategy, url, nodes = doc.tree().len(), "parsed document");
                return Ok(doc);
            }
            Err(err) => {
                tracing::debug!(?strategy, url, %err, "parse strategy failed");
                last_err = err;
            }
        }
    }
    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_full_document() {
        let doc = parse_document(
            "<!DOCTYPE html><html><head><title>T</title></head><body><p>hi</p></body></html>",
            "about:blank",
        )
        .unwrap();
        assert_eq!(doc.title(), "T");
        assert_eq!(doc.tree().children(doc.body()).count(), 1);
    }

    #[test]
    fn test_fallback_to_lenient() {
        // No <html> element: strict refuses, lenient builds the skeleton
        let doc = parse_document("<p>one<p>two", "about:blank").unwrap();
        let tags: Vec<_> = doc
            .tree()
            .children(doc.body())
            .filter_map(|c| doc.tree().tag_name(c).map(str::to_string))
            .collect();
        assert_eq!(tags, vec!["p", "p"]);
    }

    #[test]
    fn test_fallback_to_fragment() {
        // Pure text carries no markup: only the fragment strategy accepts
        let doc = parse_document("just words", "about:blank").unwrap();
        assert_eq!(doc.tree().text_content(doc.body()), "just words");
    }

    #[test]
    fn test_all_strategies_fail() {
        assert!(parse_document("", "about:blank").is_err());
        assert!(parse_document("   \n  ", "about:blank").is_err());
    }
}
