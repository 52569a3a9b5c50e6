//! In-memory text providers
//!
//! Ready-made [`TextProvider`] implementations for documents whose text is
//! already available: a static list of positioned runs (loadable from JSON)
//! and a set of live content trees.

use async_trait::async_trait;
use serde::Deserialize;

use super::error::{ExtractionError, Result};
use super::traits::TextProvider;
use super::types::{FontDescriptor, TextRun, Transform};
use crate::highlight::ContentTree;

/// JSON document layout: `{"pages": [[{"text": ...}, ...], ...]}`
#[derive(Debug, Deserialize)]
struct DocumentFile {
    pages: Vec<Vec<RunSpec>>,
}

#[derive(Debug, Deserialize)]
struct RunSpec {
    text: String,
    #[serde(default)]
    transform: Transform,
    #[serde(default)]
    font: FontDescriptor,
}

/// Provider over pre-extracted pages
#[derive(Debug, Clone, Default)]
pub struct StaticTextProvider {
    pages: Vec<Vec<TextRun>>,
}

impl StaticTextProvider {
    /// Build from runs grouped by page; page numbers and item indices are
    /// reassigned from position.
    pub fn new(pages: Vec<Vec<TextRun>>) -> Self {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(page_idx, runs)| {
                runs.into_iter()
                    .enumerate()
                    .map(|(item_index, mut run)| {
                        run.page_number = page_idx as u32 + 1;
                        run.item_index = item_index;
                        run
                    })
                    .collect()
            })
            .collect();
        Self { pages }
    }

    /// Build from plain strings, one run per string
    pub fn from_texts<P, S>(pages: P) -> Self
    where
        P: IntoIterator,
        P::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            pages
                .into_iter()
                .map(|runs| runs.into_iter().map(|text| TextRun::new(0, 0, text)).collect())
                .collect(),
        )
    }

    /// Parse the JSON document layout
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let file: DocumentFile = serde_json::from_str(json)?;
        Ok(Self::new(
            file.pages
                .into_iter()
                .map(|runs| {
                    runs.into_iter()
                        .map(|spec| {
                            TextRun::new(0, 0, spec.text)
                                .with_transform(spec.transform)
                                .with_font(spec.font)
                        })
                        .collect()
                })
                .collect(),
        ))
    }

    /// Runs of a page, if it exists
    pub fn page(&self, page_number: u32) -> Option<&[TextRun]> {
        page_number
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx as usize))
            .map(Vec::as_slice)
    }
}

#[async_trait]
impl TextProvider for StaticTextProvider {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn extract_page_text(&self, page_number: u32) -> Result<Vec<TextRun>> {
        self.page(page_number)
            .map(<[TextRun]>::to_vec)
            .ok_or(ExtractionError::PageNotFound(page_number))
    }
}

/// Provider over live content trees, one tree per page
///
/// Each text-bearing leaf becomes a run whose `item_index` is the leaf's
/// position in document order, which is what the in-place highlighter walks.
#[derive(Debug, Clone, Default)]
pub struct ContentTreeProvider {
    pages: Vec<ContentTree>,
}

impl ContentTreeProvider {
    pub fn new(pages: Vec<ContentTree>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl TextProvider for ContentTreeProvider {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn extract_page_text(&self, page_number: u32) -> Result<Vec<TextRun>> {
        let tree = page_number
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx as usize))
            .ok_or(ExtractionError::PageNotFound(page_number))?;

        Ok(tree
            .text_leaves()
            .into_iter()
            .enumerate()
            .map(|(item_index, text)| TextRun::new(page_number, item_index, text))
            .collect())
    }
}
