use std::fs::File;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use illustra_core::{parse_number, RowField, SummaryField};

use crate::logging;
use crate::workspace::{slot_index, Workspace};

pub fn import_csv(workspace: &Workspace, input: PathBuf) -> Result<()> {
    let file =
        File::open(&input).with_context(|| format!("failed to open {}", input.display()))?;
    let filename = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let mut session = workspace.session()?;
    let slots = session.import_csv(file, &filename)?;
    if slots.is_empty() {
        logging::status(format!("{filename}: no option blocks with rows"));
        return Ok(());
    }
    for slot in &slots {
        if let Some(option) = session.option(*slot)? {
            logging::status(format!(
                "{} loaded into slot {} ({} rows)",
                option.name,
                slot + 1,
                option.rows.len()
            ));
        }
    }
    workspace.commit(&session)
}

pub fn set_override(
    workspace: &Workspace,
    slot: usize,
    year: u32,
    field: String,
    value: f64,
) -> Result<()> {
    let slot = slot_index(slot)?;
    let field: RowField = field.parse()?;
    if !value.is_finite() {
        return Err(anyhow!("override value must be a finite number"));
    }
    let mut session = workspace.session()?;
    session.set_override(slot, year, field, value)?;
    logging::status(format!("slot {} year {year} {field} = {value}", slot + 1));
    workspace.commit(&session)
}

pub fn reset_overrides(workspace: &Workspace, slot: Option<usize>) -> Result<()> {
    let slot = slot.map(slot_index).transpose()?;
    let mut session = workspace.session()?;
    let removed = session.reset_overrides(slot)?;
    logging::status(format!("removed {removed} overrides"));
    workspace.commit(&session)
}

pub fn clear(workspace: &Workspace, slot: usize) -> Result<()> {
    let slot = slot_index(slot)?;
    let mut session = workspace.session()?;
    match session.clear_option(slot)? {
        Some(option) => logging::status(format!("cleared {} from slot {}", option.name, slot + 1)),
        None => logging::status(format!("slot {} was already empty", slot + 1)),
    }
    workspace.commit(&session)
}

pub fn edit_summary(workspace: &Workspace, slot: usize, field: String, value: String) -> Result<()> {
    let slot = slot_index(slot)?;
    let field: SummaryField = field.parse()?;
    let value = parse_summary_value(&value)?;
    let mut session = workspace.session()?;
    session.set_summary_field(slot, field, value)?;
    logging::status(format!(
        "slot {} {} = {}",
        slot + 1,
        field.as_str(),
        value.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
    ));
    workspace.commit(&session)
}

fn parse_summary_value(raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse_number(trimmed)
        .map(Some)
        .ok_or_else(|| anyhow!("not a number: {raw}"))
}
