use async_trait::async_trait;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use super::summary::{Pick, SectionRule};
use super::table::{page_window, scan_table, ColumnMap, RowBounds, TableLayout};
use super::CarrierParser;
use crate::config::ParseOptions;
use crate::document::{collapse_whitespace, page_lines, IllustrationDocument};
use crate::error::Result;
use crate::model::{Carrier, IllustrationRow, IllustrationSummary, SummaryField};

const DEFAULT_TABLE_START: u32 = 10;
const DEFAULT_TABLE_END: u32 = 20;
const DEFAULT_SUMMARY_PAGE: u32 = 16;
const SUMMARY_SEARCH_PAGES: u32 = 30;
const FALLBACK_SUMMARY_PAGES: [u32; 4] = [14, 15, 16, 17];

// Rows lead with a two-digit age, then the policy year.
static LAYOUT: Lazy<TableLayout> = Lazy::new(|| TableLayout {
    row_start: Regex::new(r"^\d{2}\s+\d").expect("valid regex"),
    min_tokens: 11,
    columns: ColumnMap::new(1, 0, 2, 9, 10),
    bounds: RowBounds::new(100, 120),
});

static PREMIUM_INFORMATION_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"premium\s+information|required\s+premiums|minimum\s+required\s+annual\s+premium|base\s+policy|total\s+minimum\s+required|do\s+not\s+include\s+the\s+cost\s+of\s+additional\s+benefits",
    )
    .expect("valid regex")
});

static BASE_POLICY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Base\s+Policy").expect("valid regex"));

static SECTIONS: Lazy<Vec<(SummaryField, SectionRule)>> = Lazy::new(|| {
    let rule = |anchor: &str, window, terminators: &str, min, max, pick| SectionRule {
        anchor: Regex::new(&format!("(?i){anchor}")).expect("valid regex"),
        window,
        terminators: Regex::new(&format!("(?i){terminators}")).expect("valid regex"),
        min,
        max,
        pick,
    };
    vec![
        (
            SummaryField::BaseAnnualPremium,
            rule(
                r"Base\s+Policy",
                350,
                r"Level\s+Premium|\d+\s+Year\s+Term",
                100.0,
                50_000.0,
                Pick::Last,
            ),
        ),
        (
            SummaryField::PuaPremium,
            rule(
                r"Level\s+Premium\s+PUA\s+Rider",
                200,
                r"\d+\s+Year\s+Term|Single\s+Premium|Total\s+Minimum",
                100.0,
                100_000.0,
                Pick::Max,
            ),
        ),
        (
            SummaryField::TermPremium,
            rule(
                r"\d+\s+Year\s+Term\s+Rider",
                150,
                r"Level\s+Premium|Single\s+Premium|Total\s+Minimum|Coverages\s+paid",
                100.0,
                50_000.0,
                Pick::Last,
            ),
        ),
        (
            SummaryField::SpuaPremium,
            rule(
                r"Single\s+Premium\s+PUA\s+Rider",
                150,
                r"Paid\s+after|Other\s+Riders|Riders\s+with",
                1_000.0,
                500_000.0,
                Pick::Last,
            ),
        ),
    ]
});

/// Lafayette Life: fixed, user-adjustable table window and a "Premium
/// Information" page broken into per-rider sections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lafayette;

impl Lafayette {
    async fn find_premium_information_page(
        &self,
        doc: &dyn IllustrationDocument,
    ) -> Result<Option<u32>> {
        for page in 1..=SUMMARY_SEARCH_PAGES.min(doc.page_count()) {
            let lines = page_lines(doc, page).await?;
            let text = collapse_whitespace(&lines.join(" ").to_lowercase());
            if PREMIUM_INFORMATION_MARKERS.is_match(&text) {
                tracing::debug!(page, "found premium information section");
                return Ok(Some(page));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl CarrierParser for Lafayette {
    fn carrier(&self) -> Carrier {
        Carrier::Lafayette
    }

    async fn parse_table(
        &self,
        doc: &dyn IllustrationDocument,
        opts: &ParseOptions,
    ) -> Result<Vec<IllustrationRow>> {
        let page_count = doc.page_count();
        let start = opts.table_start().unwrap_or(DEFAULT_TABLE_START);
        let end = opts
            .table_end()
            .unwrap_or_else(|| DEFAULT_TABLE_END.min(page_count));
        tracing::info!(start, end, "lafayette table pages");
        let rows = scan_table(doc, page_window(start, end, page_count), &LAYOUT).await?;
        tracing::info!(rows = rows.len(), "lafayette parsing complete");
        Ok(rows)
    }

    async fn extract_summary(
        &self,
        doc: &dyn IllustrationDocument,
        rows: &[IllustrationRow],
        opts: &ParseOptions,
    ) -> Result<IllustrationSummary> {
        let mut summary = IllustrationSummary::seeded(Carrier::Lafayette, rows);
        let summary_page = match opts.summary_page() {
            Some(page) => page,
            None => self
                .find_premium_information_page(doc)
                .await?
                .unwrap_or(DEFAULT_SUMMARY_PAGE),
        };

        let page_count = doc.page_count();
        let candidates: Vec<u32> = [summary_page, summary_page.saturating_sub(1), summary_page + 1]
            .into_iter()
            .chain(FALLBACK_SUMMARY_PAGES)
            .filter(|page| (1..=page_count).contains(page))
            .unique()
            .collect();
        let mut tried = Vec::new();
        let mut text = None;
        for page in candidates {
            tried.push(page);
            let lines = page_lines(doc, page).await?;
            let flat = collapse_whitespace(&lines.join(" "));
            if BASE_POLICY.is_match(&flat) {
                tracing::debug!(page, "using page for lafayette summary");
                text = Some(flat);
                break;
            }
        }
        let Some(text) = text else {
            tracing::debug!(?tried, "no base policy section found");
            return Ok(summary);
        };

        for (field, rule) in SECTIONS.iter() {
            if let Some(value) = rule.extract(&text) {
                summary.set(*field, Some(value));
            }
        }
        Ok(summary)
    }
}
