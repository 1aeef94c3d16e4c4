use std::borrow::Cow;
use std::io::Read;

use csv::{ByteRecord, ReaderBuilder};

use crate::error::{IllustraError, Result};
use crate::model::{
    whole_number, Carrier, IllustrationOption, IllustrationRow, IllustrationSummary, OptionSource,
    SourceKind, SLOT_COUNT,
};
use crate::normalization::normalize_rows;
use crate::tokens::parse_number;

const BLOCK_ANCHOR: &str = "yr";

/// An option read from one column block, with the slot it belongs in.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedOption {
    pub slot: usize,
    pub option: IllustrationOption,
}

/// Reads a side-by-side comparison export.
///
/// The first record holds option names, the second the column headers. Each
/// header cell equal to `yr` starts a block of six columns: year, age, annual
/// premium, cumulative outlay, cash value, death benefit. Blocks fill slots
/// left to right; blocks past the last slot and blocks without rows are
/// skipped. Cells that are not valid UTF-8 are decoded lossily.
pub fn import_csv<R: Read>(reader: R, filename: &str) -> Result<Vec<ImportedOption>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = reader.byte_records();
    let names = records
        .next()
        .transpose()?
        .ok_or(IllustraError::CsvShape("missing name row"))?;
    let columns = records
        .next()
        .transpose()?
        .ok_or(IllustraError::CsvShape("missing column row"))?;
    let data = records.collect::<std::result::Result<Vec<_>, _>>()?;

    let anchors: Vec<usize> = (0..columns.len())
        .filter(|idx| {
            cell(&columns, *idx).is_some_and(|text| text.trim().eq_ignore_ascii_case(BLOCK_ANCHOR))
        })
        .collect();
    tracing::debug!(blocks = anchors.len(), records = data.len(), "csv blocks");

    let mut imported = Vec::new();
    for (slot, anchor) in anchors.into_iter().enumerate() {
        if slot >= SLOT_COUNT {
            tracing::warn!(slot, "ignoring csv block past the last option slot");
            break;
        }
        let rows: Vec<IllustrationRow> = data
            .iter()
            .filter_map(|record| read_block_row(record, anchor))
            .collect();
        if rows.is_empty() {
            continue;
        }
        let name = cell(&names, anchor)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Option {}", slot + 1));
        let rows = normalize_rows(rows);
        let summary = IllustrationSummary::seeded(Carrier::Csv, &rows);
        imported.push(ImportedOption {
            slot,
            option: IllustrationOption {
                name,
                carrier: Carrier::Csv,
                rows,
                summary,
                source: OptionSource {
                    filename: filename.to_string(),
                    kind: SourceKind::Csv,
                },
            },
        });
    }
    Ok(imported)
}

fn cell(record: &ByteRecord, idx: usize) -> Option<Cow<'_, str>> {
    record.get(idx).map(String::from_utf8_lossy)
}

fn read_block_row(record: &ByteRecord, anchor: usize) -> Option<IllustrationRow> {
    let value = |offset: usize| cell(record, anchor + offset).and_then(|text| parse_number(&text));
    let year = value(0).and_then(whole_number).filter(|year| *year > 0)?;
    let age = value(1).and_then(whole_number)?;
    let mut row = IllustrationRow::new(year, age);
    row.annual_premium = value(2);
    row.cumulative_outlay = value(3);
    row.cash_value = value(4);
    row.death_benefit = value(5);
    Some(row)
}
