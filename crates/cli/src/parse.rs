use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use illustra_core::{
    page_lines, Carrier, IllustrationDocument, MemoryDocument, ParseOptions, PdfIllustration,
};

use crate::cli::PageWindow;
use crate::logging;
use crate::workspace::{slot_index, Workspace};

const STDIN_NAME: &str = "stdin.pdf";

/// An opened input plus the file name shown as the option's default name.
struct OpenedDocument {
    doc: Box<dyn IllustrationDocument>,
    filename: String,
}

fn open_document(input: &str) -> Result<OpenedDocument> {
    if input == "-" {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("failed to read pdf from stdin")?;
        let pdf = PdfIllustration::from_bytes(STDIN_NAME, &bytes)?;
        return Ok(OpenedDocument {
            doc: Box::new(pdf),
            filename: STDIN_NAME.to_string(),
        });
    }
    let path = Path::new(input);
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string());
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let doc: Box<dyn IllustrationDocument> = if is_json {
        Box::new(
            MemoryDocument::load_json(path)
                .with_context(|| format!("failed to load document {input}"))?,
        )
    } else {
        let pdf = PdfIllustration::open(path).with_context(|| format!("failed to open {input}"))?;
        Box::new(pdf)
    };
    Ok(OpenedDocument { doc, filename })
}

fn window_options(window: &PageWindow) -> ParseOptions {
    ParseOptions::builder()
        .table_start(window.table_start)
        .table_end(window.table_end)
        .summary_page(window.summary_page)
        .build()
}

pub fn run(
    workspace: &Workspace,
    input: String,
    carrier: String,
    slot: usize,
    name: Option<String>,
    window: PageWindow,
) -> Result<()> {
    let carrier: Carrier = carrier.parse()?;
    let slot = slot_index(slot)?;
    let opts = window_options(&window).or(workspace.config.carrier_defaults(carrier));
    let opened = open_document(&input)?;
    let mut session = workspace.session()?;

    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    let option = runtime.block_on(session.ingest_pdf(
        slot,
        carrier,
        name.as_deref(),
        &opened.filename,
        opened.doc.as_ref(),
        &opts,
    ))?;
    logging::status(format!(
        "{} loaded into slot {}: {} rows, first-year premium {}",
        option.name,
        slot + 1,
        option.rows.len(),
        option
            .summary
            .total_first_year_premium()
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| "n/a".to_string())
    ));
    workspace.commit(&session)
}

pub fn run_lines(input: String, page: u32) -> Result<()> {
    let opened = open_document(&input)?;
    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    let lines = runtime.block_on(page_lines(opened.doc.as_ref(), page))?;
    for (idx, line) in lines.iter().enumerate() {
        println!("{:>3}: {line}", idx + 1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_flags_fill_only_what_was_given() {
        let window = PageWindow {
            table_start: Some(12),
            table_end: None,
            summary_page: Some(0),
        };
        let defaults = ParseOptions::builder().table_window(10, 20).summary_page(Some(16)).build();
        let opts = window_options(&window).or(defaults);
        assert_eq!(opts.table_start(), Some(12));
        assert_eq!(opts.table_end(), Some(20));
        assert_eq!(opts.summary_page(), Some(16));
    }

    #[test]
    fn json_documents_open_without_pdf_support() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        let doc = MemoryDocument::blank(2).with_page_lines(2, &["45 1 100"]);
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
        let opened = open_document(path.to_str().unwrap()).unwrap();
        assert_eq!(opened.filename, "fixture.json");
        assert_eq!(opened.doc.page_count(), 2);
    }
}
