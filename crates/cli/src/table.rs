use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};

use illustra_core::{ComparisonSession, IllustrationSummary, Metric, SummaryField, Toggles};
use illustra_store::JsonlWriter;

use crate::cli::MetricFlags;
use crate::logging;
use crate::workspace::Workspace;

const CELL_WIDTH: usize = 13;

fn effective_toggles(session: &ComparisonSession, flags: &MetricFlags) -> Toggles {
    let saved = session.toggles();
    Toggles {
        cash_increase: saved.cash_increase || flags.cash_increase,
        efficiency: saved.efficiency || flags.efficiency,
        irr: saved.irr || flags.irr,
    }
}

fn years(session: &mut ComparisonSession, all_years: bool) -> Vec<u32> {
    if all_years {
        session.show_all_years();
    }
    session.visible_years()
}

pub fn show(workspace: &Workspace, all_years: bool, flags: MetricFlags) -> Result<()> {
    let mut session = workspace.session()?;
    if session.loaded().count() == 0 {
        logging::status("no options loaded; use `parse` or `import-csv` first");
        return Ok(());
    }
    let metrics = effective_toggles(&session, &flags).metrics();
    let years = years(&mut session, all_years);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render(&session, &metrics, &years, &mut out)?;
    Ok(())
}

fn render<W: Write>(
    session: &ComparisonSession,
    metrics: &[Metric],
    years: &[u32],
    out: &mut W,
) -> Result<()> {
    for (slot, option) in session.loaded() {
        writeln!(
            out,
            "[{}] {} ({}, {})",
            slot + 1,
            option.name,
            option.carrier.display_name(),
            option.source.filename
        )?;
        writeln!(out, "    {}", summary_line(&option.summary))?;
    }
    writeln!(out)?;

    let slots: Vec<usize> = session.loaded().map(|(slot, _)| slot).collect();
    let mut header = format!("{:>5}", "Year");
    for slot in &slots {
        for metric in metrics {
            let label = format!("{}:{}", slot + 1, short_label(*metric));
            header.push_str(&format!(" {label:>CELL_WIDTH$}"));
        }
    }
    writeln!(out, "{header}")?;
    for year in years {
        let mut line = format!("{year:>5}");
        for slot in &slots {
            for metric in metrics {
                let mut cell = format_value(*metric, session.metric_value(*slot, *year, *metric));
                let overridden = metric
                    .row_field()
                    .map(|field| session.overrides().contains(*slot, *year, field))
                    .unwrap_or(false);
                if overridden {
                    cell.push('*');
                }
                line.push_str(&format!(" {cell:>CELL_WIDTH$}"));
            }
        }
        writeln!(out, "{line}")?;
    }
    if !session.overrides().is_empty() {
        writeln!(out, "\n* overridden value")?;
    }
    Ok(())
}

fn short_label(metric: Metric) -> &'static str {
    match metric {
        Metric::Age => "Age",
        Metric::AnnualPremium => "Premium",
        Metric::CumulativeOutlay => "Outlay",
        Metric::CashValue => "Cash Value",
        Metric::DeathBenefit => "Death Ben.",
        Metric::CashValueIncrease => "CV Incr.",
        Metric::CashValueEfficiency => "CV Eff.",
        Metric::Irr => "IRR",
    }
}

fn summary_line(summary: &IllustrationSummary) -> String {
    let mut parts: Vec<String> = SummaryField::ALL
        .into_iter()
        .map(|field| format!("{}={}", field.as_str(), format_money(summary.get(field))))
        .collect();
    parts.push(format!(
        "totalFirstYear={}",
        format_money(summary.total_first_year_premium())
    ));
    parts.join(" ")
}

fn format_value(metric: Metric, value: Option<f64>) -> String {
    match metric {
        Metric::Age => value
            .map(|age| format!("{age:.0}"))
            .unwrap_or_else(|| "-".to_string()),
        _ if metric.is_ratio() => value
            .map(|ratio| format!("{:.2}%", ratio * 100.0))
            .unwrap_or_else(|| "-".to_string()),
        _ => format_money(value),
    }
}

fn format_money(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::new();
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// One JSON record per visible year with every loaded option's values.
fn year_record(session: &ComparisonSession, metrics: &[Metric], year: u32) -> Value {
    let options: Vec<Value> = session
        .loaded()
        .map(|(slot, option)| {
            let values: Map<String, Value> = metrics
                .iter()
                .map(|metric| {
                    let value = session
                        .metric_value(slot, year, *metric)
                        .map(Value::from)
                        .unwrap_or(Value::Null);
                    (metric.as_str().to_string(), value)
                })
                .collect();
            json!({
                "slot": slot + 1,
                "name": option.name,
                "carrier": option.carrier,
                "values": values,
            })
        })
        .collect();
    json!({ "year": year, "options": options })
}

pub fn export(workspace: &Workspace, path: PathBuf, all_years: bool) -> Result<()> {
    let mut session = workspace.session()?;
    let metrics = session.toggles().metrics();
    let years = years(&mut session, all_years);
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = JsonlWriter::new(BufWriter::new(file));
    for year in &years {
        writer.write_record(&year_record(&session, &metrics, *year))?;
    }
    let written = writer
        .finish()
        .with_context(|| format!("failed to write {}", path.display()))?;
    logging::status(format!("wrote {written} years to {}", path.display()));
    Ok(())
}
