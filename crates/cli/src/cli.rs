use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "illustra", version, about = "Compare life-insurance illustrations side by side")]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Working session file; overrides `[session] path`.
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PageWindow {
    #[arg(long = "table-start")]
    pub table_start: Option<u32>,
    #[arg(long = "table-end")]
    pub table_end: Option<u32>,
    #[arg(long = "summary-page")]
    pub summary_page: Option<u32>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MetricFlags {
    #[arg(long = "cash-increase", action = ArgAction::SetTrue)]
    pub cash_increase: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    pub efficiency: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    pub irr: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a carrier illustration into an option slot.
    Parse {
        /// PDF file, `-` for stdin, or a pre-extracted `.json` document.
        input: String,
        #[arg(long)]
        carrier: String,
        #[arg(long, default_value_t = 1)]
        slot: usize,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        window: PageWindow,
    },
    /// Import a side-by-side comparison CSV.
    ImportCsv { input: PathBuf },
    /// Print the reconstructed lines of one page.
    Lines {
        input: String,
        #[arg(long)]
        page: u32,
    },
    /// Print the comparison table.
    Show {
        #[arg(long = "all-years", action = ArgAction::SetTrue)]
        all_years: bool,
        #[command(flatten)]
        metrics: MetricFlags,
    },
    Override {
        slot: usize,
        year: u32,
        field: String,
        value: f64,
    },
    ResetOverrides {
        #[arg(long)]
        slot: Option<usize>,
    },
    Clear { slot: usize },
    /// Set a summary figure; `none` clears it.
    EditSummary {
        slot: usize,
        field: String,
        value: String,
    },
    Save {
        name: String,
        /// Replace an existing saved comparison.
        #[arg(long)]
        id: Option<String>,
    },
    List,
    Load { id: String },
    Delete { id: String },
    Export {
        #[arg(long)]
        jsonl: PathBuf,
        #[arg(long = "all-years", action = ArgAction::SetTrue)]
        all_years: bool,
    },
}
