use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::document::{check_page, fragments_from_lines, IllustrationDocument, TextFragment};
use crate::error::{IllustraError, Result};

/// A PDF illustration loaded through `pdf-extract`.
///
/// Text is extracted once at open time. The extractor hands back page text in
/// reading order, so each line is laid out at a fixed pitch and one fragment is
/// emitted per word; line reconstruction then yields the same lines back.
#[derive(Debug, Clone)]
pub struct PdfIllustration {
    path: PathBuf,
    pages: Vec<String>,
}

impl PdfIllustration {
    #[cfg(feature = "pdf")]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let pages = pdf_extract::extract_text_by_pages(path)
            .map_err(|e| IllustraError::Pdf(format!("pdf extract failed: {e}")))?;
        tracing::info!(path = %path.display(), pages = pages.len(), "opened pdf");
        Ok(Self {
            path: path.to_path_buf(),
            pages,
        })
    }

    /// Loads an in-memory PDF; `name` stands in for the file path.
    #[cfg(feature = "pdf")]
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| IllustraError::Pdf(format!("pdf extract failed: {e}")))?;
        tracing::info!(name, pages = pages.len(), "loaded pdf from memory");
        Ok(Self {
            path: PathBuf::from(name),
            pages,
        })
    }

    #[cfg(not(feature = "pdf"))]
    pub fn open<P: AsRef<Path>>(_path: P) -> Result<Self> {
        Err(IllustraError::PdfSupportDisabled)
    }

    #[cfg(not(feature = "pdf"))]
    pub fn from_bytes(_name: &str, _bytes: &[u8]) -> Result<Self> {
        Err(IllustraError::PdfSupportDisabled)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used as the default option name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[async_trait]
impl IllustrationDocument for PdfIllustration {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn page_fragments(&self, page: u32) -> Result<Vec<TextFragment>> {
        check_page(page, self.page_count())?;
        let lines: Vec<&str> = self.pages[page as usize - 1]
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        Ok(fragments_from_lines(&lines))
    }
}
