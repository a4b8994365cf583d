//! Selector data model and matching
//!
//! Complex selectors are matched right-to-left: the rightmost compound
//! is tested against the candidate element, then combinators walk the
//! ancestor chain. Candidate sets are restricted to a subtree root, but
//! combinator ancestry may reach above it.

use std::fmt;

use skiff_dom::{DomTree, NodeId};

/// Selector syntax error, surfaced at registration time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected character `{0}` in selector")]
    UnexpectedChar(char),
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
    #[error("selector component has no simple selectors")]
    EmptyComponent,
    #[error("combinator without a following component")]
    DanglingCombinator,
}

/// How an attribute selector compares values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeMatcher {
    /// `[attr=value]` - exact match
    Exact(String),
}

/// `[attr]` / `[attr=value]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
}

impl AttributeSelector {
    fn matches(&self, value: Option<&str>) -> bool {
        match (&self.matcher, value) {
            (None, Some(_)) => true,
            (Some(AttributeMatcher::Exact(expected)), Some(actual)) => expected == actual,
            _ => false,
        }
    }
}

/// One compound selector: `tag#id.class[attr=value]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttributeSelector>,
}

impl Compound {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(el) = tree.node(node).as_element() else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if el.name != *tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|a| a.matches(el.attr(&a.name)))
    }
}

/// Combinator between compounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace - any strict ancestor
    Descendant,
    /// `>` - parent
    Child,
}

/// One complex selector: compounds joined by combinators
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// Rightmost compound, tested against the candidate itself
    key: Compound,
    /// Remaining compounds, right to left, each with the combinator that
    /// links it to the compound on its right
    rest: Vec<(Combinator, Compound)>,
}

impl Complex {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.key.matches(tree, node) && match_rest(tree, node, &self.rest)
    }
}

fn match_rest(tree: &DomTree, node: NodeId, rest: &[(Combinator, Compound)]) -> bool {
    let Some(((comb, comp), tail)) = rest.split_first() else {
        return true;
    };
    match comb {
        Combinator::Child => {
            let parent = tree.node(node).parent;
            parent.is_valid() && comp.matches(tree, parent) && match_rest(tree, parent, tail)
        }
        Combinator::Descendant => tree
            .ancestors(node)
            .any(|anc| comp.matches(tree, anc) && match_rest(tree, anc, tail)),
    }
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    complexes: Vec<Complex>,
    source: String,
}

impl Selector {
    /// Parse a selector list; errors are configuration errors
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim().to_string();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut complexes = Vec::new();
        for part in split_list(&source) {
            complexes.push(parse_complex(part.trim())?);
        }
        tracing::trace!(selector = %source, complexes = complexes.len(), "parsed selector");
        Ok(Self { complexes, source })
    }

    /// Whether an element matches any complex in the list
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.complexes.iter().any(|c| c.matches(tree, node))
    }

    /// All matching strict descendants of `root`, in document order
    pub fn match_all(&self, tree: &DomTree, root: NodeId) -> Vec<NodeId> {
        tree.descendants(root)
            .filter(|&n| tree.node(n).is_element() && self.matches(tree, n))
            .collect()
    }

    /// Nearest of `from` and its ancestors, up to but excluding
    /// `boundary`, that matches. Event-delegation lookup.
    pub fn closest_within(
        &self,
        tree: &DomTree,
        from: NodeId,
        boundary: NodeId,
    ) -> Option<NodeId> {
        let mut cur = from;
        while cur.is_valid() && cur != boundary {
            if tree.node(cur).is_element() && self.matches(tree, cur) {
                return Some(cur);
            }
            cur = tree.node(cur).parent;
        }
        None
    }

    /// The original selector text
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split on top-level commas, respecting brackets and quotes
fn split_list(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '"' | '\'' => match quote {
                Some(q) if q == ch => quote = None,
                None => quote = Some(ch),
                _ => {}
            },
            '[' if quote.is_none() => depth += 1,
            ']' if quote.is_none() => depth = depth.saturating_sub(1),
            ',' if quote.is_none() && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        &self.input[start..self.pos]
    }
}

fn parse_complex(input: &str) -> Result<Complex, SelectorError> {
    if input.is_empty() {
        return Err(SelectorError::Empty);
    }
    let mut cur = Cursor { input, pos: 0 };
    let mut compounds = vec![parse_compound(&mut cur)?];
    let mut combinators = Vec::new();
    loop {
        let saw_ws = cur.skip_ws();
        match cur.peek() {
            None => break,
            Some('>') => {
                cur.bump();
                cur.skip_ws();
                if cur.peek().is_none() {
                    return Err(SelectorError::DanglingCombinator);
                }
                combinators.push(Combinator::Child);
            }
            Some(_) if saw_ws => combinators.push(Combinator::Descendant),
            Some(ch) => return Err(SelectorError::UnexpectedChar(ch)),
        }
        compounds.push(parse_compound(&mut cur)?);
    }
    // Reorder right-to-left for matching
    let key = compounds.pop().unwrap_or_default();
    let mut rest = Vec::with_capacity(combinators.len());
    while let (Some(comp), Some(comb)) = (compounds.pop(), combinators.pop()) {
        rest.push((comb, comp));
    }
    Ok(Complex { key, rest })
}

fn parse_compound(cur: &mut Cursor<'_>) -> Result<Compound, SelectorError> {
    let mut comp = Compound::default();
    let mut saw_any = false;
    loop {
        match cur.peek() {
            Some('*') => {
                cur.bump();
                saw_any = true;
            }
            Some('#') => {
                cur.bump();
                let name = cur.ident();
                if name.is_empty() {
                    return Err(SelectorError::EmptyComponent);
                }
                comp.id = Some(name.to_string());
                saw_any = true;
            }
            Some('.') => {
                cur.bump();
                let name = cur.ident();
                if name.is_empty() {
                    return Err(SelectorError::EmptyComponent);
                }
                comp.classes.push(name.to_string());
                saw_any = true;
            }
            Some('[') => {
                cur.bump();
                comp.attrs.push(parse_attribute(cur)?);
                saw_any = true;
            }
            Some(ch) if is_ident_char(ch) => {
                let name = cur.ident();
                comp.tag = Some(name.to_ascii_lowercase());
                saw_any = true;
            }
            _ => break,
        }
    }
    if !saw_any {
        return Err(SelectorError::EmptyComponent);
    }
    Ok(comp)
}

fn parse_attribute(cur: &mut Cursor<'_>) -> Result<AttributeSelector, SelectorError> {
    cur.skip_ws();
    let name = cur.ident().to_string();
    if name.is_empty() {
        return Err(SelectorError::EmptyComponent);
    }
    cur.skip_ws();
    match cur.peek() {
        Some(']') => {
            cur.bump();
            Ok(AttributeSelector {
                name,
                matcher: None,
            })
        }
        Some('=') => {
            cur.bump();
            cur.skip_ws();
            let value = match cur.peek() {
                Some(q @ ('"' | '\'')) => {
                    cur.bump();
                    let start = cur.pos;
                    while cur.peek().is_some_and(|c| c != q) {
                        cur.bump();
                    }
                    let value = cur.input[start..cur.pos].to_string();
                    if cur.bump().is_none() {
                        return Err(SelectorError::UnterminatedAttribute);
                    }
                    value
                }
                _ => {
                    let start = cur.pos;
                    while cur.peek().is_some_and(|c| c != ']' && !c.is_whitespace()) {
                        cur.bump();
                    }
                    cur.input[start..cur.pos].to_string()
                }
            };
            cur.skip_ws();
            match cur.bump() {
                Some(']') => Ok(AttributeSelector {
                    name,
                    matcher: Some(AttributeMatcher::Exact(value)),
                }),
                _ => Err(SelectorError::UnterminatedAttribute),
            }
        }
        Some(ch) => Err(SelectorError::UnexpectedChar(ch)),
        None => Err(SelectorError::UnterminatedAttribute),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (DomTree, NodeId, NodeId, NodeId, NodeId) {
        // <div id="outer" class="box"><p class="note hot"><em></em></p></div><span data-x="1"></span>
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        tree.set_attr(outer, "id", "outer");
        tree.set_attr(outer, "class", "box");
        let p = tree.create_element("p");
        tree.set_attr(p, "class", "note hot");
        let em = tree.create_element("em");
        let span = tree.create_element("span");
        tree.set_attr(span, "data-x", "1");
        tree.append_child(NodeId::ROOT, outer);
        tree.append_child(outer, p);
        tree.append_child(p, em);
        tree.append_child(NodeId::ROOT, span);
        (tree, outer, p, em, span)
    }

    #[test]
    fn test_simple_selectors() {
        let (tree, outer, p, _, span) = fixture();
        assert!(Selector::parse("#outer").unwrap().matches(&tree, outer));
        assert!(Selector::parse(".note").unwrap().matches(&tree, p));
        assert!(Selector::parse("p.note.hot").unwrap().matches(&tree, p));
        assert!(!Selector::parse("p.cold").unwrap().matches(&tree, p));
        assert!(Selector::parse("[data-x]").unwrap().matches(&tree, span));
        assert!(Selector::parse("[data-x=1]").unwrap().matches(&tree, span));
        assert!(!Selector::parse("[data-x=2]").unwrap().matches(&tree, span));
        assert!(Selector::parse("*").unwrap().matches(&tree, span));
    }

    #[test]
    fn test_combinators() {
        let (tree, _, _, em, _) = fixture();
        assert!(Selector::parse("div em").unwrap().matches(&tree, em));
        assert!(Selector::parse("#outer > p > em").unwrap().matches(&tree, em));
        assert!(!Selector::parse("div > em").unwrap().matches(&tree, em));
        assert!(!Selector::parse("span em").unwrap().matches(&tree, em));
    }

    #[test]
    fn test_selector_list() {
        let (tree, outer, _, _, span) = fixture();
        let sel = Selector::parse("span, #outer").unwrap();
        assert!(sel.matches(&tree, outer));
        assert!(sel.matches(&tree, span));
    }

    #[test]
    fn test_match_all_document_order() {
        let (tree, outer, p, em, span) = fixture();
        let all = Selector::parse("*").unwrap().match_all(&tree, NodeId::ROOT);
        assert_eq!(all, vec![outer, p, em, span]);
        // Scoped to a subtree: root itself excluded
        let scoped = Selector::parse("*").unwrap().match_all(&tree, outer);
        assert_eq!(scoped, vec![p, em]);
    }

    #[test]
    fn test_quoted_attribute_value() {
        let sel = Selector::parse("link[rel=\"stylesheet\"][href]").unwrap();
        let mut tree = DomTree::new();
        let link = tree.create_element("link");
        tree.set_attr(link, "rel", "stylesheet");
        tree.set_attr(link, "href", "/a.css");
        tree.append_child(NodeId::ROOT, link);
        assert!(sel.matches(&tree, link));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Selector::parse("").unwrap_err(), SelectorError::Empty);
        assert_eq!(Selector::parse("   ").unwrap_err(), SelectorError::Empty);
        assert!(Selector::parse("div >").is_err());
        assert!(Selector::parse(".").is_err());
        assert!(Selector::parse("[foo").is_err());
        assert!(matches!(
            Selector::parse("div ~ p"),
            Err(SelectorError::UnexpectedChar('~')) | Err(SelectorError::EmptyComponent)
        ));
    }

    #[test]
    fn test_closest_within() {
        let (tree, outer, p, em, _) = fixture();
        let sel = Selector::parse(".note").unwrap();
        assert_eq!(sel.closest_within(&tree, em, outer), Some(p));
        // Boundary itself is excluded
        let sel_outer = Selector::parse("#outer").unwrap();
        assert_eq!(sel_outer.closest_within(&tree, em, outer), None);
    }
}
