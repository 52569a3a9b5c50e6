//! Mutable content trees for reflowable pages
//!
//! A page of an EPUB-like document is a tree of elements whose text lives in
//! leaf nodes. In-place highlighting splits those leaves and wraps each
//! occurrence in a marker node; restoring unwraps every marker and merges the
//! neighbouring text back together, so the tree's text content is the same
//! before annotation and after restore.

use std::collections::BTreeMap;
use std::mem;

use serde::{Deserialize, Serialize};

use super::is_markup_name;
use super::segments::{self, HighlightSpan, SegmentKind};
use crate::config::{HighlightConfig, DEFAULT_INDEX_ATTRIBUTE};

/// One node of a page's content tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ContentNode {
    Text { text: String },
    Element { tag: String, children: Vec<ContentNode> },
    /// Highlight marker wrapping one occurrence
    Marker {
        /// 1-based match ordinal
        ordinal: usize,
        current: bool,
        text: String,
    },
}

impl ContentNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn element(tag: impl Into<String>, children: Vec<ContentNode>) -> Self {
        Self::Element {
            tag: tag.into(),
            children,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text { text } | Self::Marker { text, .. } => out.push_str(text),
            Self::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Content of one page
///
/// Always normalized: every constructor, deserialization included, goes
/// through [`ContentTree::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ContentNode>", into = "Vec<ContentNode>")]
pub struct ContentTree {
    nodes: Vec<ContentNode>,
}

impl From<Vec<ContentNode>> for ContentTree {
    fn from(nodes: Vec<ContentNode>) -> Self {
        Self::new(nodes)
    }
}

impl From<ContentTree> for Vec<ContentNode> {
    fn from(tree: ContentTree) -> Self {
        tree.nodes
    }
}

impl ContentTree {
    /// Build a tree, merging adjacent text nodes and dropping empty ones
    pub fn new(nodes: Vec<ContentNode>) -> Self {
        let mut tree = Self { nodes };
        normalize(&mut tree.nodes);
        tree
    }

    pub fn nodes(&self) -> &[ContentNode] {
        &self.nodes
    }

    /// Concatenated text of the whole tree, markers included
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.collect_text(&mut out);
        }
        out
    }

    /// Text leaves of the restored tree, in document order
    ///
    /// Leaf positions are the `item_index` of the runs extracted from this
    /// tree, and the positions [`ContentTree::annotate`] counts after a
    /// restore.
    pub fn text_leaves(&self) -> Vec<String> {
        fn walk(nodes: &[ContentNode], out: &mut Vec<String>) {
            for node in nodes {
                match node {
                    ContentNode::Text { text } => out.push(text.clone()),
                    ContentNode::Element { children, .. } => walk(children, out),
                    ContentNode::Marker { .. } => {}
                }
            }
        }

        let mut out = Vec::new();
        if self.marker_count() == 0 {
            walk(&self.nodes, &mut out);
        } else {
            let mut plain = self.clone();
            plain.restore();
            walk(&plain.nodes, &mut out);
        }
        out
    }

    /// Number of markers currently in the tree
    pub fn marker_count(&self) -> usize {
        fn walk(nodes: &[ContentNode]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    ContentNode::Marker { .. } => 1,
                    ContentNode::Element { children, .. } => walk(children),
                    ContentNode::Text { .. } => 0,
                })
                .sum()
        }
        walk(&self.nodes)
    }

    /// Wrap occurrences in markers
    ///
    /// `plan` maps a leaf position to the spans to wrap in that leaf. A span's
    /// `match_id` becomes the marker's ordinal minus one. Returns the number
    /// of markers inserted.
    pub fn annotate(&mut self, plan: &BTreeMap<usize, Vec<HighlightSpan>>) -> usize {
        let mut leaf = 0;
        let mut inserted = 0;
        annotate_nodes(&mut self.nodes, plan, &mut leaf, &mut inserted);
        inserted
    }

    /// Unwrap every marker; returns how many were removed
    pub fn restore(&mut self) -> usize {
        let removed = unwrap_markers(&mut self.nodes);
        normalize(&mut self.nodes);
        removed
    }

    pub fn to_html(&self, config: &HighlightConfig) -> String {
        let mut html = String::new();
        write_html(&self.nodes, config, &mut html);
        html
    }
}

fn annotate_nodes(
    nodes: &mut Vec<ContentNode>,
    plan: &BTreeMap<usize, Vec<HighlightSpan>>,
    leaf: &mut usize,
    inserted: &mut usize,
) {
    for node in mem::take(nodes) {
        match node {
            ContentNode::Text { text } => {
                let position = *leaf;
                *leaf += 1;

                let Some(spans) = plan.get(&position) else {
                    nodes.push(ContentNode::Text { text });
                    continue;
                };
                for segment in segments::split(&text, spans) {
                    match segment.kind {
                        SegmentKind::Plain => nodes.push(ContentNode::Text { text: segment.text }),
                        SegmentKind::Highlight { match_id, current } => {
                            *inserted += 1;
                            nodes.push(ContentNode::Marker {
                                ordinal: match_id + 1,
                                current,
                                text: segment.text,
                            });
                        }
                    }
                }
            }
            ContentNode::Element { tag, mut children } => {
                annotate_nodes(&mut children, plan, leaf, inserted);
                nodes.push(ContentNode::Element { tag, children });
            }
            marker @ ContentNode::Marker { .. } => nodes.push(marker),
        }
    }
}

fn unwrap_markers(nodes: &mut [ContentNode]) -> usize {
    let mut removed = 0;
    for node in nodes.iter_mut() {
        match node {
            ContentNode::Marker { text, .. } => {
                *node = ContentNode::Text {
                    text: mem::take(text),
                };
                removed += 1;
            }
            ContentNode::Element { children, .. } => removed += unwrap_markers(children),
            ContentNode::Text { .. } => {}
        }
    }
    removed
}

fn normalize(nodes: &mut Vec<ContentNode>) {
    let mut merged: Vec<ContentNode> = Vec::with_capacity(nodes.len());
    for mut node in mem::take(nodes) {
        match &mut node {
            ContentNode::Text { text } => {
                if text.is_empty() {
                    continue;
                }
                if let Some(ContentNode::Text { text: prev }) = merged.last_mut() {
                    prev.push_str(text);
                    continue;
                }
            }
            ContentNode::Element { children, .. } => normalize(children),
            ContentNode::Marker { .. } => {}
        }
        merged.push(node);
    }
    *nodes = merged;
}

fn write_html(nodes: &[ContentNode], config: &HighlightConfig, out: &mut String) {
    for node in nodes {
        match node {
            ContentNode::Text { text } => out.push_str(&html_escape::encode_text(text)),
            ContentNode::Element { tag, children } => {
                if !is_markup_name(tag) {
                    tracing::warn!(tag = %tag, "Dropping element with an unusable tag name");
                    write_html(children, config, out);
                    continue;
                }
                out.push('<');
                out.push_str(tag);
                out.push('>');
                write_html(children, config, out);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            ContentNode::Marker {
                ordinal,
                current,
                text,
            } => {
                let mut class = config.marker_class.clone();
                if *current {
                    class.push(' ');
                    class.push_str(&config.marker_current_class);
                }
                let attribute = if is_markup_name(&config.index_attribute) {
                    config.index_attribute.as_str()
                } else {
                    DEFAULT_INDEX_ATTRIBUTE
                };
                out.push_str(&format!(
                    "<mark class=\"{}\" {}=\"{}\">{}</mark>",
                    html_escape::encode_double_quoted_attribute(&class),
                    attribute,
                    ordinal,
                    html_escape::encode_text(text)
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(range: std::ops::Range<usize>, match_id: usize, current: bool) -> HighlightSpan {
        HighlightSpan {
            range,
            match_id,
            current,
        }
    }

    fn sample() -> ContentTree {
        ContentTree::new(vec![
            ContentNode::element("h1", vec![ContentNode::text("The cat")]),
            ContentNode::element(
                "p",
                vec![
                    ContentNode::text("sat on "),
                    ContentNode::element("em", vec![ContentNode::text("the mat")]),
                ],
            ),
        ])
    }

    #[test]
    fn test_new_merges_adjacent_text() {
        let tree = ContentTree::new(vec![
            ContentNode::text("a"),
            ContentNode::text(""),
            ContentNode::text("b"),
            ContentNode::element("p", vec![ContentNode::text(""), ContentNode::text("c")]),
        ]);
        assert_eq!(tree.text_leaves(), vec!["ab", "c"]);
    }

    #[test]
    fn test_annotate_wraps_occurrences() {
        let mut tree = sample();
        let plan = BTreeMap::from([
            (0, vec![span(5..7, 0, false)]),
            (1, vec![span(1..3, 1, true)]),
            (2, vec![span(5..7, 2, false)]),
        ]);

        assert_eq!(tree.annotate(&plan), 3);
        assert_eq!(tree.marker_count(), 3);
        assert_eq!(tree.text_content(), "The catsat on the mat");

        let html = tree.to_html(&HighlightConfig::default());
        assert!(html.contains(
            "<mark class=\"search-highlight search-current\" data-search-index=\"2\">at</mark>"
        ));
        assert!(html.contains(
            "<em>the m<mark class=\"search-highlight\" data-search-index=\"3\">at</mark></em>"
        ));
    }

    #[test]
    fn test_restore_returns_original_tree() {
        let original = sample();
        let mut tree = original.clone();
        tree.annotate(&BTreeMap::from([(1, vec![span(0..1, 0, true), span(4..6, 1, false)])]));
        assert_ne!(tree, original);

        assert_eq!(tree.restore(), 2);
        assert_eq!(tree, original);
        assert_eq!(tree.restore(), 0);
    }

    #[test]
    fn test_html_escapes_text() {
        let tree = ContentTree::new(vec![ContentNode::element(
            "p",
            vec![ContentNode::text("1 < 2 & 3")],
        )]);
        assert_eq!(tree.to_html(&HighlightConfig::default()), "<p>1 &lt; 2 &amp; 3</p>");
    }

    #[test]
    fn test_html_drops_unusable_names() {
        let mut tree = ContentTree::new(vec![ContentNode::element(
            "p onclick=alert(1)",
            vec![ContentNode::text("cat")],
        )]);
        tree.annotate(&BTreeMap::from([(0, vec![span(0..3, 0, false)])]));
        let config = HighlightConfig {
            index_attribute: "x\" onmouseover=\"y".to_string(),
            ..HighlightConfig::default()
        };

        assert_eq!(
            tree.to_html(&config),
            "<mark class=\"search-highlight\" data-search-index=\"1\">cat</mark>"
        );
    }

    #[test]
    fn test_deserialized_tree_is_normalized() {
        let json = r#"[{"type": "element", "tag": "p", "children": [
            {"type": "text", "text": ""},
            {"type": "text", "text": "one cat "},
            {"type": "text", "text": "two cat"}
        ]}]"#;
        let tree: ContentTree = serde_json::from_str(json).unwrap();

        assert_eq!(tree.text_leaves(), vec!["one cat two cat"]);
        assert_eq!(
            tree,
            ContentTree::new(vec![ContentNode::element(
                "p",
                vec![ContentNode::text("one cat two cat")],
            )])
        );

        let reparsed: ContentTree =
            serde_json::from_str(&serde_json::to_string(&tree).unwrap()).unwrap();
        assert_eq!(reparsed, tree);
    }

    #[test]
    fn test_leaves_of_annotated_tree_match_restored_view() {
        let mut tree = sample();
        let leaves = tree.text_leaves();
        tree.annotate(&BTreeMap::from([(1, vec![span(1..3, 0, true)])]));
        assert_eq!(tree.text_leaves(), leaves);
    }
}
