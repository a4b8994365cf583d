//! Tag-soup tokenizer and tree builder
//!
//! One tokenizer serves all strategies; the strategies differ in what
//! the tree builder tolerates. Whitespace-only text nodes are dropped,
//! and comments are kept only inside open elements.

use skiff_dom::{Document, DomTree, NodeId};

/// Parse strategy, in decreasing order of standards-correctness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Balanced tags and an explicit `<html>` element required
    Strict,
    /// Tag-soup recovery: auto-close mismatches, ignore strays
    Lenient,
    /// Input is body content; wrap it in a fresh skeleton
    Fragment,
}

/// Fatal parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty input")]
    EmptyInput,
    #[error("document has no <html> element")]
    MissingHtmlElement,
    #[error("document contains no markup")]
    NoMarkup,
    #[error("mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag { expected: String, found: String },
    #[error("stray end tag </{0}>")]
    StrayEndTag(String),
    #[error("unclosed element <{0}>")]
    UnclosedElement(String),
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "title", "textarea"];

const HEAD_ELEMENTS: &[&str] = &["title", "meta", "link", "base", "style"];

/// Elements a new sibling of the same name implicitly closes
const AUTO_CLOSE: &[&str] = &["p", "li", "option", "dt", "dd", "tr", "td", "th"];

/// Parse with a single strategy
pub fn parse_with(html: &str, url: &str, strategy: Strategy) -> Result<Document, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let mut builder = Builder::new(strategy);
    let mut tokenizer = Tokenizer::new(html);
    while let Some(token) = tokenizer.next_token() {
        builder.token(token, &mut tokenizer)?;
    }
    builder.finish(url)
}

enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    Text(String),
    Comment(String),
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_until(&mut self, needle: &str) -> &'a str {
        match self.rest().find(needle) {
            Some(i) => {
                let text = &self.rest()[..i];
                self.pos += i + needle.len();
                text
            }
            None => {
                let text = self.rest();
                self.pos = self.input.len();
                text
            }
        }
    }

    fn tag_name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':')
        {
            self.bump();
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn next_token(&mut self) -> Option<Token> {
        if self.pos >= self.input.len() {
            return None;
        }
        let rest = self.rest();
        if rest.starts_with("<!--") {
            self.pos += 4;
            let text = self.take_until("-->").to_string();
            return Some(Token::Comment(text));
        }
        if rest.starts_with("<!") {
            self.pos += 2;
            let content = self.take_until(">").trim().to_string();
            let name = content
                .strip_prefix("DOCTYPE")
                .or_else(|| content.strip_prefix("doctype"))
                .map(|n| n.trim().to_ascii_lowercase())
                .unwrap_or_default();
            return Some(Token::Doctype(name));
        }
        if rest.starts_with("</") {
            self.pos += 2;
            let name = self.tag_name();
            self.take_until(">");
            return Some(Token::EndTag(name));
        }
        if rest.starts_with('<') && rest[1..].chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        {
            self.bump();
            let name = self.tag_name();
            let mut attrs = Vec::new();
            let mut self_closing = false;
            loop {
                self.skip_ws();
                match self.peek() {
                    None => break,
                    Some('>') => {
                        self.bump();
                        break;
                    }
                    Some('/') => {
                        self.bump();
                        if self.peek() == Some('>') {
                            self.bump();
                            self_closing = true;
                            break;
                        }
                    }
                    Some(_) => {
                        let attr_name = self.attr_name();
                        if attr_name.is_empty() {
                            // Unparseable junk inside the tag; drop a char
                            self.bump();
                            continue;
                        }
                        self.skip_ws();
                        let value = if self.peek() == Some('=') {
                            self.bump();
                            self.skip_ws();
                            self.attr_value()
                        } else {
                            String::new()
                        };
                        attrs.push((attr_name, value));
                    }
                }
            }
            return Some(Token::StartTag {
                name,
                attrs,
                self_closing,
            });
        }
        // Text: everything up to the next '<' (or a literal stray '<')
        if rest.starts_with('<') {
            self.bump();
            return Some(Token::Text("<".to_string()));
        }
        let end = rest.find('<').unwrap_or(rest.len());
        let text = &rest[..end];
        self.pos += end;
        Some(Token::Text(decode_entities(text)))
    }

    fn attr_name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
        {
            self.bump();
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn attr_value(&mut self) -> String {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let mut quote = [0u8; 4];
                let needle = q.encode_utf8(&mut quote);
                decode_entities(self.take_until(needle))
            }
            _ => {
                let start = self.pos;
                while self.peek().is_some_and(|c| !c.is_whitespace() && c != '>') {
                    self.bump();
                }
                decode_entities(&self.input[start..self.pos])
            }
        }
    }

    /// Consume raw text up to (and including) `</name>`; returns the
    /// text and whether the close tag was found
    fn raw_text(&mut self, name: &str) -> (String, bool) {
        let close = format!("</{name}");
        let lower = self.rest().to_ascii_lowercase();
        match lower.find(&close) {
            Some(i) => {
                let text = self.rest()[..i].to_string();
                self.pos += i + close.len();
                self.take_until(">");
                (text, true)
            }
            None => {
                let text = self.rest().to_string();
                self.pos = self.input.len();
                (text, false)
            }
        }
    }
}

/// Decode the handful of entities that matter for attribute URLs and
/// text content; unknown entities pass through untouched
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        let Some(end) = rest.find(';').filter(|&e| e <= 10) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..end];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            "nbsp" => out.push('\u{a0}'),
            _ => {
                let decoded = entity
                    .strip_prefix('#')
                    .and_then(|num| {
                        if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                            u32::from_str_radix(hex, 16).ok()
                        } else {
                            num.parse::<u32>().ok()
                        }
                    })
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('&');
                        out.push_str(entity);
                        out.push(';');
                    }
                }
            }
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Auto,
    Head,
    Body,
}

struct Builder {
    strategy: Strategy,
    tree: DomTree,
    html: Option<NodeId>,
    head: Option<NodeId>,
    body: Option<NodeId>,
    stack: Vec<NodeId>,
    section: Section,
    body_started: bool,
    saw_tag: bool,
    saw_html_tag: bool,
}

impl Builder {
    fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            tree: DomTree::new(),
            html: None,
            head: None,
            body: None,
            stack: Vec::new(),
            section: Section::Auto,
            body_started: strategy == Strategy::Fragment,
            saw_tag: false,
            saw_html_tag: false,
        }
    }

    fn ensure_html(&mut self) -> NodeId {
        if let Some(html) = self.html {
            return html;
        }
        let html = self.tree.create_element("html");
        self.tree.append_child(NodeId::ROOT, html);
        self.html = Some(html);
        html
    }

    fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head {
            return head;
        }
        let html = self.ensure_html();
        let head = self.tree.create_element("head");
        self.tree.append_child(html, head);
        self.head = Some(head);
        head
    }

    fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body {
            return body;
        }
        self.ensure_head();
        let html = self.ensure_html();
        let body = self.tree.create_element("body");
        self.tree.append_child(html, body);
        self.body = Some(body);
        body
    }

    /// Where a non-structural node lands when no element is open
    fn auto_parent(&mut self, name: Option<&str>) -> NodeId {
        match self.section {
            Section::Head => self.ensure_head(),
            Section::Body => self.ensure_body(),
            Section::Auto => {
                let head_ish = name.is_some_and(|n| HEAD_ELEMENTS.contains(&n))
                    || (name == Some("script") && !self.body_started);
                if head_ish && !self.body_started {
                    self.ensure_head()
                } else {
                    self.body_started = true;
                    self.ensure_body()
                }
            }
        }
    }

    fn token(&mut self, token: Token, tokenizer: &mut Tokenizer<'_>) -> Result<(), ParseError> {
        match token {
            Token::Doctype(name) => {
                if self.html.is_none() {
                    let id = self
                        .tree
                        .push_node(skiff_dom::NodeData::Doctype(if name.is_empty() {
                            "html".to_string()
                        } else {
                            name
                        }));
                    self.tree.append_child(NodeId::ROOT, id);
                }
                Ok(())
            }
            Token::Comment(text) => {
                if let Some(&top) = self.stack.last() {
                    let id = self.tree.create_comment(&text);
                    self.tree.append_child(top, id);
                }
                Ok(())
            }
            Token::Text(text) => {
                if text.trim().is_empty() {
                    return Ok(());
                }
                let parent = match self.stack.last() {
                    Some(&top) => top,
                    None => self.auto_parent(None),
                };
                let id = self.tree.create_text(&text);
                self.tree.append_child(parent, id);
                Ok(())
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                self.saw_tag = true;
                match name.as_str() {
                    "html" => {
                        self.saw_html_tag = true;
                        let html = self.ensure_html();
                        self.merge_attrs(html, &attrs);
                        Ok(())
                    }
                    "head" => {
                        let head = self.ensure_head();
                        self.merge_attrs(head, &attrs);
                        if self.stack.is_empty() {
                            self.section = Section::Head;
                        }
                        Ok(())
                    }
                    "body" => {
                        let body = self.ensure_body();
                        self.merge_attrs(body, &attrs);
                        self.body_started = true;
                        if self.stack.is_empty() {
                            self.section = Section::Body;
                        }
                        Ok(())
                    }
                    _ => self.start_element(&name, &attrs, self_closing, tokenizer),
                }
            }
            Token::EndTag(name) => self.end_element(&name),
        }
    }

    fn merge_attrs(&mut self, el: NodeId, attrs: &[(String, String)]) {
        for (name, value) in attrs {
            self.tree.set_attr(el, name, value);
        }
    }

    fn start_element(
        &mut self,
        name: &str,
        attrs: &[(String, String)],
        self_closing: bool,
        tokenizer: &mut Tokenizer<'_>,
    ) -> Result<(), ParseError> {
        if self.strategy != Strategy::Strict
            && AUTO_CLOSE.contains(&name)
            && self
                .stack
                .last()
                .is_some_and(|&top| self.tree.tag_name(top) == Some(name))
        {
            self.stack.pop();
        }
        let parent = match self.stack.last() {
            Some(&top) => top,
            None => self.auto_parent(Some(name)),
        };
        let el = self.tree.create_element(name);
        for (attr_name, value) in attrs {
            self.tree.set_attr(el, attr_name, value);
        }
        self.tree.append_child(parent, el);
        if RAW_TEXT_ELEMENTS.contains(&name) && !self_closing {
            let (text, closed) = tokenizer.raw_text(name);
            if !text.is_empty() {
                let id = self.tree.create_text(&text);
                self.tree.append_child(el, id);
            }
            if !closed && self.strategy == Strategy::Strict {
                return Err(ParseError::UnclosedElement(name.to_string()));
            }
            return Ok(());
        }
        if !self_closing && !VOID_ELEMENTS.contains(&name) {
            self.stack.push(el);
        }
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<(), ParseError> {
        match name {
            "html" | "head" | "body" => {
                self.section = Section::Auto;
                return Ok(());
            }
            _ => {}
        }
        let top_name = self
            .stack
            .last()
            .and_then(|&id| self.tree.tag_name(id))
            .map(str::to_string);
        if top_name.as_deref() == Some(name) {
            self.stack.pop();
            return Ok(());
        }
        let in_stack = self
            .stack
            .iter()
            .rev()
            .position(|&id| self.tree.tag_name(id) == Some(name));
        match in_stack {
            Some(_) => {
                if self.strategy == Strategy::Strict {
                    return Err(ParseError::MismatchedEndTag {
                        expected: top_name.unwrap_or_default(),
                        found: name.to_string(),
                    });
                }
                // Auto-close everything above the matching element
                while let Some(&id) = self.stack.last() {
                    let matched = self.tree.tag_name(id) == Some(name);
                    self.stack.pop();
                    if matched {
                        break;
                    }
                }
                Ok(())
            }
            None => {
                if self.strategy == Strategy::Strict {
                    return Err(ParseError::StrayEndTag(name.to_string()));
                }
                Ok(())
            }
        }
    }

    fn finish(mut self, url: &str) -> Result<Document, ParseError> {
        if self.strategy == Strategy::Strict {
            if let Some(&open) = self.stack.last() {
                let name = self.tree.tag_name(open).unwrap_or("?").to_string();
                return Err(ParseError::UnclosedElement(name));
            }
            if !self.saw_html_tag {
                return Err(ParseError::MissingHtmlElement);
            }
        }
        if self.strategy == Strategy::Lenient && !self.saw_tag {
            return Err(ParseError::NoMarkup);
        }
        self.ensure_body();
        Ok(Document::from_tree(self.tree, url))
    }
}
