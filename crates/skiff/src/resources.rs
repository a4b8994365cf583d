//! Script and stylesheet dedup
//!
//! Tracks every external script and stylesheet ever requested, keyed by
//! the raw src/href attribute text. A resource is marked loaded the
//! moment its load is scheduled, so repeated navigations to documents
//! carrying the same assets request each exactly once.

use std::collections::HashSet;
use std::collections::VecDeque;

use skiff_dom::{Document, NodeId};

use crate::command::Command;

#[derive(Default)]
pub struct ResourceRegistry {
    scripts: HashSet<String>,
    styles: HashSet<String>,
}

fn is_external_script(doc: &Document, id: NodeId) -> Option<String> {
    let tree = doc.tree();
    if tree.tag_name(id) != Some("script") {
        return None;
    }
    tree.attr(id, "src").map(|s| s.to_owned())
}

fn is_stylesheet_link(doc: &Document, id: NodeId) -> Option<String> {
    let tree = doc.tree();
    if tree.tag_name(id) != Some("link") {
        return None;
    }
    let rel = tree.attr(id, "rel")?;
    if !rel.eq_ignore_ascii_case("stylesheet") {
        return None;
    }
    tree.attr(id, "href").map(|s| s.to_owned())
}

impl ResourceRegistry {
    /// Record every script and stylesheet already present in the live
    /// document, without issuing load commands. Called once at startup
    /// so the host's initial page assets are never re-requested.
    pub fn seed(&mut self, doc: &Document) {
        for id in doc.tree().descendants(NodeId::ROOT).collect::<Vec<_>>() {
            if let Some(src) = is_external_script(doc, id) {
                self.scripts.insert(src);
            }
            if let Some(href) = is_stylesheet_link(doc, id) {
                self.styles.insert(href);
            }
        }
    }

    pub fn script_seen(&self, src: &str) -> bool {
        self.scripts.contains(src)
    }

    pub fn style_seen(&self, href: &str) -> bool {
        self.styles.contains(href)
    }

    /// Reconcile an incoming document's external resources against the
    /// live one. Scripts are stripped from the incoming tree (the host
    /// executes them; they never enter the live DOM twice) and unseen
    /// ones are scheduled in document order. Unseen stylesheet links are
    /// copied into the live head and scheduled.
    pub fn sync(
        &mut self,
        incoming: &mut Document,
        live: &mut Document,
        commands: &mut VecDeque<Command>,
    ) {
        let all: Vec<NodeId> = incoming.tree().descendants(NodeId::ROOT).collect();

        for &id in &all {
            if incoming.tree().tag_name(id) != Some("script") {
                continue;
            }
            let src = incoming.tree().attr(id, "src").map(|s| s.to_owned());
            incoming.tree_mut().detach(id);
            let Some(src) = src else {
                // Inline scripts are dropped outright.
                continue;
            };
            if self.scripts.insert(src.clone()) {
                commands.push_back(Command::LoadScript { url: src });
            }
        }

        for &id in &all {
            let Some(href) = is_stylesheet_link(incoming, id) else {
                continue;
            };
            if self.styles.insert(href.clone()) {
                let copy = live.tree_mut().adopt(incoming.tree(), id);
                let head = live.head();
                live.tree_mut().append_child(head, copy);
                commands.push_back(Command::LoadStylesheet { url: href });
            }
            incoming.tree_mut().detach(id);
        }
    }
}
