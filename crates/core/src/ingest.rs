use crate::carriers::{parser_for, CarrierParser};
use crate::config::ParseOptions;
use crate::document::IllustrationDocument;
use crate::error::{IllustraError, Result};
use crate::model::{Carrier, IllustrationRow, IllustrationSummary};
use crate::normalization::normalize_rows;

/// Rows and summary produced by one carrier parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedIllustration {
    pub rows: Vec<IllustrationRow>,
    pub summary: IllustrationSummary,
}

/// Parses the table, extracts the summary from the raw rows, then normalizes.
pub async fn parse_with(
    parser: &dyn CarrierParser,
    doc: &dyn IllustrationDocument,
    opts: &ParseOptions,
) -> Result<ParsedIllustration> {
    let carrier = parser.carrier();
    tracing::info!(%carrier, pages = doc.page_count(), "parsing illustration");
    let raw = parser.parse_table(doc, opts).await?;
    let summary = parser.extract_summary(doc, &raw, opts).await?;
    let rows = normalize_rows(raw);
    tracing::info!(%carrier, rows = rows.len(), "parsed illustration");
    Ok(ParsedIllustration { rows, summary })
}

/// Looks up the registered parser for `carrier` and runs it.
pub async fn parse_illustration(
    carrier: Carrier,
    doc: &dyn IllustrationDocument,
    opts: &ParseOptions,
) -> Result<ParsedIllustration> {
    let parser = parser_for(carrier).ok_or(IllustraError::UnsupportedCarrier(carrier))?;
    parse_with(parser, doc, opts).await
}
