//! Replay-Stable Selector Resolution
//!
//! Turns a DOM node into a single CSS-style selector meant to find the same
//! element on a freshly loaded copy of the page. Heuristics are tried in a
//! fixed priority order and the first match wins.
//!
//! The resolver never checks the document for collisions: two elements can
//! resolve to the same selector. Robustness under re-navigation is preferred
//! over capture-time uniqueness.

use crate::dom::{Document, DomNode, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

/// Elements whose `name` attribute identifies them
const FORM_CONTROLS: &[&str] = &[
    "input", "select", "textarea", "button", "form", "fieldset", "output",
];

/// Elements whose `placeholder` attribute identifies them
const PLACEHOLDER_ELEMENTS: &[&str] = &["input", "textarea"];

/// Elements that may be located by their text
const TEXT_ELEMENTS: &[&str] = &["button", "a"];

/// Which heuristic produced a selector, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorSource {
    Id,
    TestId,
    Name,
    Class,
    AriaLabel,
    Placeholder,
    Text,
    NthChild,
    TagName,
    Document,
}

/// A resolved selector plus the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSelector {
    pub value: String,
    pub source: SelectorSource,
}

/// Priority-chain selector resolver
#[derive(Debug, Clone)]
pub struct SelectorResolver {
    /// Text must be strictly shorter than this to be used for buttons/links
    pub max_text_len: usize,
    /// Classes must be strictly longer than this to count as meaningful
    pub min_class_len: usize,
}

impl SelectorResolver {
    pub fn new() -> Self {
        Self {
            max_text_len: 50,
            min_class_len: 2,
        }
    }

    /// Resolve a node to a selector string. Never fails.
    pub fn resolve(&self, doc: &Document, id: NodeId) -> String {
        self.resolve_with_source(doc, id).value
    }

    /// Resolve a node and report which rule matched
    pub fn resolve_with_source(&self, doc: &Document, id: NodeId) -> ResolvedSelector {
        // Bounded by node count so a cyclic snapshot still terminates
        self.resolve_bounded(doc, id, doc.len())
    }

    fn resolve_bounded(&self, doc: &Document, id: NodeId, budget: usize) -> ResolvedSelector {
        let node = match doc.node(id) {
            Some(node) if node.kind == NodeKind::Element => node,
            _ => {
                return ResolvedSelector {
                    value: "document".to_string(),
                    source: SelectorSource::Document,
                }
            }
        };

        if let Some(found) = self.match_attributes(doc, id, node) {
            return found;
        }

        let tag = node.tag_name.as_str();
        match (doc.parent_element(id), doc.element_index(id)) {
            (Some(parent), Some(index)) if budget > 0 => {
                let parent_selector = self.resolve_bounded(doc, parent, budget - 1);
                ResolvedSelector {
                    value: format!("{} > {}:nth-child({})", parent_selector.value, tag, index),
                    source: SelectorSource::NthChild,
                }
            }
            _ => ResolvedSelector {
                value: tag.to_string(),
                source: SelectorSource::TagName,
            },
        }
    }

    /// Rules 1-7: attribute and text based selectors
    fn match_attributes(&self, doc: &Document, id: NodeId, node: &DomNode) -> Option<ResolvedSelector> {
        let tag = node.tag_name.as_str();
        let found = |value: String, source: SelectorSource| Some(ResolvedSelector { value, source });

        if let Some(element_id) = node.attr("id") {
            return found(format!("#{}", element_id), SelectorSource::Id);
        }

        if let Some(test_id) = node.attr("data-testid") {
            return found(attribute_selector("data-testid", test_id), SelectorSource::TestId);
        }

        if FORM_CONTROLS.contains(&tag) {
            if let Some(name) = node.attr("name") {
                return found(attribute_selector("name", name), SelectorSource::Name);
            }
        }

        if let Some(class) = self.meaningful_class(node) {
            return found(format!(".{}", class), SelectorSource::Class);
        }

        if let Some(label) = node.attr("aria-label") {
            return found(attribute_selector("aria-label", label), SelectorSource::AriaLabel);
        }

        if PLACEHOLDER_ELEMENTS.contains(&tag) {
            if let Some(placeholder) = node.attr("placeholder") {
                return found(
                    attribute_selector("placeholder", placeholder),
                    SelectorSource::Placeholder,
                );
            }
        }

        if TEXT_ELEMENTS.contains(&tag) {
            let text = doc.text_content(id);
            let text = text.trim();
            if !text.is_empty() && text.chars().count() < self.max_text_len {
                return found(
                    format!("{}:has-text({})", tag, css_string(text)),
                    SelectorSource::Text,
                );
            }
        }

        None
    }

    /// First class token that does not start with `_` and is long enough
    fn meaningful_class<'a>(&self, node: &'a DomNode) -> Option<&'a str> {
        node.attr("class")?
            .split_whitespace()
            .find(|c| !c.starts_with('_') && c.chars().count() > self.min_class_len)
    }
}

impl Default for SelectorResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// `[name="value"]` with the value escaped
fn attribute_selector(name: &str, value: &str) -> String {
    format!("[{}={}]", name, css_string(value))
}

/// Double-quoted CSS string literal
pub fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
