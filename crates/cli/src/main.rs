mod cli;
mod config;
mod edit;
mod logging;
mod parse;
mod saved;
mod table;
mod workspace;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::{load_config, DEFAULT_CONFIG};
use crate::workspace::Workspace;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = if cli.verbose {
        true
    } else {
        logging::env_flag()
    };
    logging::init(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logging::status(format!("error: {err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = load_config(&config_path)?;
    let workspace = Workspace::new(config, cli.session);

    match cli.command {
        Command::Parse {
            input,
            carrier,
            slot,
            name,
            window,
        } => parse::run(&workspace, input, carrier, slot, name, window),
        Command::ImportCsv { input } => edit::import_csv(&workspace, input),
        Command::Lines { input, page } => parse::run_lines(input, page),
        Command::Show { all_years, metrics } => table::show(&workspace, all_years, metrics),
        Command::Override {
            slot,
            year,
            field,
            value,
        } => edit::set_override(&workspace, slot, year, field, value),
        Command::ResetOverrides { slot } => edit::reset_overrides(&workspace, slot),
        Command::Clear { slot } => edit::clear(&workspace, slot),
        Command::EditSummary { slot, field, value } => {
            edit::edit_summary(&workspace, slot, field, value)
        }
        Command::Save { name, id } => saved::save(&workspace, name, id),
        Command::List => saved::list(&workspace),
        Command::Load { id } => saved::load(&workspace, id),
        Command::Delete { id } => saved::delete(&workspace, id),
        Command::Export { jsonl, all_years } => table::export(&workspace, jsonl, all_years),
    }
}
