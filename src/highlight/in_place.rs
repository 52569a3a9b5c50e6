//! In-place highlight strategy
//!
//! For rendering models that own a mutable content tree per page (reflowable
//! documents). Matching text leaves are split and each occurrence is wrapped
//! in a marker carrying its 1-based match ordinal.

use std::collections::{BTreeMap, HashMap};

use super::segments::HighlightSpan;
use super::tree::ContentTree;
use super::{HighlightRenderer, PageHighlights};
use crate::config::HighlightConfig;

/// Renderer that annotates attached content trees
#[derive(Debug, Default)]
pub struct InPlaceRenderer {
    config: HighlightConfig,
    trees: HashMap<u32, ContentTree>,
}

impl InPlaceRenderer {
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            trees: HashMap::new(),
        }
    }

    /// Hand over the live content of a page
    ///
    /// Leftover markers are unwrapped so leaf positions line up with the
    /// runs extracted from the same content.
    pub fn attach(&mut self, page_number: u32, mut tree: ContentTree) {
        tree.restore();
        self.trees.insert(page_number, tree);
    }

    /// Take a page's content back, with all markers removed
    pub fn detach(&mut self, page_number: u32) -> Option<ContentTree> {
        let mut tree = self.trees.remove(&page_number)?;
        tree.restore();
        Some(tree)
    }

    pub fn tree(&self, page_number: u32) -> Option<&ContentTree> {
        self.trees.get(&page_number)
    }

    pub fn to_html(&self, page_number: u32) -> Option<String> {
        self.trees
            .get(&page_number)
            .map(|tree| tree.to_html(&self.config))
    }
}

impl HighlightRenderer for InPlaceRenderer {
    fn render(&mut self, page: &PageHighlights<'_>) -> usize {
        let Some(tree) = self.trees.get_mut(&page.page_number) else {
            tracing::trace!(page = page.page_number, "No content attached; nothing to highlight");
            return 0;
        };
        tree.restore();

        let mut plan: BTreeMap<usize, Vec<HighlightSpan>> = BTreeMap::new();
        for m in page.matches.iter().filter(|m| m.page_number == page.page_number) {
            plan.entry(m.item_index).or_default().push(HighlightSpan {
                range: m.range(),
                match_id: m.id,
                current: Some(m.id) == page.current,
            });
        }
        if plan.is_empty() {
            return 0;
        }

        let inserted = tree.annotate(&plan);
        tracing::debug!(page = page.page_number, markers = inserted, "Annotated page content");
        inserted
    }

    fn clear(&mut self, page_number: u32) {
        if let Some(tree) = self.trees.get_mut(&page_number) {
            let removed = tree.restore();
            if removed > 0 {
                tracing::trace!(page = page_number, markers = removed, "Removed markers");
            }
        }
    }

    fn highlight_count(&self, page_number: u32) -> usize {
        self.trees
            .get(&page_number)
            .map(ContentTree::marker_count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextRun;
    use crate::highlight::ContentNode;
    use crate::search::scan;

    fn page_tree() -> ContentTree {
        ContentTree::new(vec![
            ContentNode::element("p", vec![ContentNode::text("Price: $5 (approx.)")]),
            ContentNode::element("p", vec![ContentNode::text("Still $5.")]),
        ])
    }

    fn runs_of(page_number: u32, tree: &ContentTree) -> Vec<TextRun> {
        tree.text_leaves()
            .into_iter()
            .enumerate()
            .map(|(i, text)| TextRun::new(page_number, i, text))
            .collect()
    }

    #[test]
    fn test_markers_carry_one_based_ordinals() {
        let mut renderer = InPlaceRenderer::default();
        renderer.attach(3, page_tree());
        let runs = runs_of(3, renderer.tree(3).unwrap());
        let matches = scan(&runs, "$5", false);

        let inserted = renderer.render(&PageHighlights {
            page_number: 3,
            runs: &runs,
            matches: &matches,
            current: Some(1),
        });
        assert_eq!(inserted, 2);

        let html = renderer.to_html(3).unwrap();
        assert!(html.contains("data-search-index=\"1\">$5</mark>"));
        assert!(html.contains(
            "<mark class=\"search-highlight search-current\" data-search-index=\"2\">$5</mark>"
        ));
    }

    #[test]
    fn test_render_then_clear_round_trips_content() {
        let original = page_tree();
        let mut renderer = InPlaceRenderer::default();
        renderer.attach(1, original.clone());
        let runs = runs_of(1, &original);

        for term in ["(approx.)", "$", ".", "s"] {
            let matches = scan(&runs, term, false);
            renderer.render(&PageHighlights {
                page_number: 1,
                runs: &runs,
                matches: &matches,
                current: Some(0),
            });
            assert_eq!(
                renderer.tree(1).unwrap().text_content(),
                original.text_content()
            );
            renderer.clear(1);
            assert_eq!(renderer.tree(1), Some(&original));
        }
    }

    #[test]
    fn test_rerender_replaces_markers() {
        let mut renderer = InPlaceRenderer::default();
        renderer.attach(1, page_tree());
        let runs = runs_of(1, renderer.tree(1).unwrap());
        let matches = scan(&runs, "$5", false);

        for current in [Some(0), Some(1)] {
            renderer.render(&PageHighlights {
                page_number: 1,
                runs: &runs,
                matches: &matches,
                current,
            });
            assert_eq!(renderer.highlight_count(1), 2);
        }
    }

    #[test]
    fn test_clear_without_content_is_noop() {
        let mut renderer = InPlaceRenderer::default();
        renderer.clear(7);
        renderer.clear(7);
        assert_eq!(renderer.highlight_count(7), 0);
        assert!(renderer.detach(7).is_none());
    }

    #[test]
    fn test_detach_restores_content() {
        let mut renderer = InPlaceRenderer::default();
        renderer.attach(1, page_tree());
        let runs = runs_of(1, renderer.tree(1).unwrap());
        let matches = scan(&runs, "still", false);
        renderer.render(&PageHighlights {
            page_number: 1,
            runs: &runs,
            matches: &matches,
            current: None,
        });
        assert_eq!(renderer.detach(1), Some(page_tree()));
    }

    #[test]
    fn test_attach_unwraps_leftover_markers() {
        let mut annotated = page_tree();
        annotated.annotate(&BTreeMap::from([(
            1,
            vec![HighlightSpan {
                range: 6..8,
                match_id: 0,
                current: true,
            }],
        )]));
        assert_eq!(annotated.marker_count(), 1);

        let mut renderer = InPlaceRenderer::default();
        renderer.attach(1, annotated);
        assert_eq!(renderer.highlight_count(1), 0);
        assert_eq!(renderer.tree(1), Some(&page_tree()));
    }
}
