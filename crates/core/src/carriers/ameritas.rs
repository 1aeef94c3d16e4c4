use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::summary::capture_amount;
use super::table::{page_window, scan_table, ColumnMap, RowBounds, TableLayout};
use super::CarrierParser;
use crate::config::ParseOptions;
use crate::document::{page_lines, IllustrationDocument};
use crate::error::Result;
use crate::model::{Carrier, IllustrationRow, IllustrationSummary};
use crate::tokens::{parse_number, tokenize};

const TABLE_START: u32 = 9;
const SUMMARY_PAGE: u32 = 4;

// Age first, then the end-of-year policy year; values read from the right edge.
static LAYOUT: Lazy<TableLayout> = Lazy::new(|| TableLayout {
    row_start: Regex::new(r"^\d+\s+\d+").expect("valid regex"),
    min_tokens: 5,
    columns: ColumnMap::new(1, 0, 2, -2, -1),
    bounds: RowBounds::new(121, 121),
});

static BASE_ANNUAL_PREMIUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Base\s+Annual\s+Premium[^$]*\$([0-9,]+\.\d{2})").expect("valid regex")
});
static LEVEL_TERM_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Level\s+Term\s+10\s+Year").expect("valid regex"));
static LEVEL_TERM_SECOND_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Level\s+Term\s+10\s+Year[^$]*\$[0-9,]+(?:\.\d{2})?[^$]*\$([0-9,]+(?:\.\d{2})?)")
        .expect("valid regex")
});
static FPUR_RECEIVED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"FPUR\s*-\s*Received\s+Premium[^$]*\$([0-9,]+\.\d{2})").expect("valid regex")
});
static FPUR_SCHEDULED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"FPUR\s+Scheduled\s+Premium[^$]*\$([0-9,]+\.\d{2})").expect("valid regex")
});
static INITIAL_PREMIUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Initial\s+Premium[^$]*\$([0-9,]+\.\d{2})").expect("valid regex")
});

/// Ameritas: table from page 9 onward, coverage summary on page 4. FPUR
/// scheduled and received premiums map to the PUA and single-premium slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ameritas;

#[async_trait]
impl CarrierParser for Ameritas {
    fn carrier(&self) -> Carrier {
        Carrier::Ameritas
    }

    async fn parse_table(
        &self,
        doc: &dyn IllustrationDocument,
        opts: &ParseOptions,
    ) -> Result<Vec<IllustrationRow>> {
        let page_count = doc.page_count();
        let start = opts.table_start().unwrap_or(TABLE_START);
        let end = opts.table_end().unwrap_or(page_count);
        tracing::info!(start, end, "ameritas table pages");
        let rows = scan_table(doc, page_window(start, end, page_count), &LAYOUT).await?;
        tracing::info!(rows = rows.len(), "ameritas parsing complete");
        Ok(rows)
    }

    async fn extract_summary(
        &self,
        doc: &dyn IllustrationDocument,
        rows: &[IllustrationRow],
        opts: &ParseOptions,
    ) -> Result<IllustrationSummary> {
        let mut summary = IllustrationSummary::seeded(Carrier::Ameritas, rows);
        let page_count = doc.page_count();
        let page = opts
            .summary_page()
            .unwrap_or(SUMMARY_PAGE)
            .min(page_count);
        if page == 0 {
            return Ok(summary);
        }
        let lines = page_lines(doc, page).await?;
        let text = lines.join(" ");

        summary.base_annual_premium = capture_amount(&BASE_ANNUAL_PREMIUM, &text)
            .or_else(|| rows.first().and_then(|row| row.annual_premium));

        let line_term = lines
            .iter()
            .find(|line| LEVEL_TERM_LINE.is_match(line))
            .and_then(|line| tokenize(line).last().and_then(|token| parse_number(token)));
        summary.term_premium =
            line_term.or_else(|| capture_amount(&LEVEL_TERM_SECOND_AMOUNT, &text));

        summary.spua_premium = capture_amount(&FPUR_RECEIVED, &text);
        summary.pua_premium = capture_amount(&FPUR_SCHEDULED, &text);

        if summary.term_premium.is_none() {
            if let Some(initial) = capture_amount(&INITIAL_PREMIUM, &text) {
                let known = summary.base_annual_premium.unwrap_or(0.0)
                    + summary.pua_premium.unwrap_or(0.0)
                    + summary.spua_premium.unwrap_or(0.0);
                let inferred = initial - known;
                if inferred > 0.0 {
                    tracing::debug!(initial, known, inferred, "inferred term premium");
                    summary.term_premium = Some(inferred);
                }
            }
        }
        Ok(summary)
    }
}
