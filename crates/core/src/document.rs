use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{IllustraError, Result};
use crate::layout::reconstruct_lines;

/// One positioned run of text on a page, in PDF user space (y grows upward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// A source document that can hand out positioned text page by page.
///
/// Pages are 1-based. Fetching a page is a suspension point; callers walk page
/// ranges sequentially.
#[async_trait]
pub trait IllustrationDocument: Send + Sync {
    fn page_count(&self) -> u32;

    async fn page_fragments(&self, page: u32) -> Result<Vec<TextFragment>>;
}

pub(crate) fn check_page(page: u32, page_count: u32) -> Result<()> {
    if page == 0 || page > page_count {
        return Err(IllustraError::PageOutOfRange { page, page_count });
    }
    Ok(())
}

/// Fetches a page and reconstructs its lines.
pub async fn page_lines(doc: &dyn IllustrationDocument, page: u32) -> Result<Vec<String>> {
    let fragments = doc.page_fragments(page).await?;
    let lines = reconstruct_lines(&fragments);
    tracing::debug!(
        page,
        fragments = fragments.len(),
        lines = lines.len(),
        "reconstructed page"
    );
    for (idx, line) in lines.iter().enumerate() {
        tracing::trace!(page, line = idx + 1, "{line}");
    }
    Ok(lines)
}

/// Lines of several pages flattened into one whitespace-collapsed blob.
pub async fn pages_text(
    doc: &dyn IllustrationDocument,
    pages: impl IntoIterator<Item = u32> + Send,
) -> Result<(String, Vec<String>)> {
    let mut all_lines = Vec::new();
    for page in pages {
        all_lines.extend(page_lines(doc, page).await?);
    }
    Ok((collapse_whitespace(&all_lines.join(" ")), all_lines))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Document held entirely in memory, used for fixtures and pre-extracted input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    pages: Vec<Vec<TextFragment>>,
}

const LINE_TOP: f64 = 760.0;
const LINE_PITCH: f64 = 12.0;

impl MemoryDocument {
    pub fn new(pages: Vec<Vec<TextFragment>>) -> Self {
        Self { pages }
    }

    /// A document with `page_count` empty pages.
    pub fn blank(page_count: u32) -> Self {
        Self {
            pages: vec![Vec::new(); page_count as usize],
        }
    }

    /// Builds pages from already-reconstructed lines, one fragment per word.
    pub fn from_lines<S: AsRef<str>>(pages: &[Vec<S>]) -> Self {
        let mut doc = Self::blank(pages.len() as u32);
        for (idx, lines) in pages.iter().enumerate() {
            doc.pages[idx] = fragments_from_lines(lines);
        }
        doc
    }

    /// Replaces one page with the given lines; grows the document if needed.
    pub fn with_page_lines<S: AsRef<str>>(mut self, page: u32, lines: &[S]) -> Self {
        let index = page.max(1) as usize - 1;
        if self.pages.len() <= index {
            self.pages.resize(index + 1, Vec::new());
        }
        self.pages[index] = fragments_from_lines(lines);
        self
    }

    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let doc: MemoryDocument = serde_json::from_reader(file)?;
        Ok(doc)
    }
}

/// Lays lines out top-down at a fixed pitch, one fragment per word.
pub(crate) fn fragments_from_lines<S: AsRef<str>>(lines: &[S]) -> Vec<TextFragment> {
    let mut fragments = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        let y = LINE_TOP - LINE_PITCH * line_idx as f64;
        let line = line.as_ref();
        let mut column = 0usize;
        for word in line.split_whitespace() {
            let offset = line[column..].find(word).map(|o| o + column).unwrap_or(column);
            fragments.push(TextFragment::new(word, offset as f64 * 5.0, y));
            column = offset + word.len();
        }
    }
    fragments
}

#[async_trait]
impl IllustrationDocument for MemoryDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn page_fragments(&self, page: u32) -> Result<Vec<TextFragment>> {
        check_page(page, self.page_count())?;
        Ok(self.pages[page as usize - 1].clone())
    }
}
