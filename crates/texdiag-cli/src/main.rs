mod summary;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use texdiag_log::{
    FilterConfig, LogScanner, SCHEMA_VERSION, ScanReport, ScannerConfig, Tally, UnmatchedPolicy,
};

#[derive(Parser)]
#[command(name = "texdiag")]
#[command(about = "Classify errors, warnings and bad boxes in TeX logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a TeX log file and emit the report as JSON
    Parse {
        /// Path to the .log file
        #[arg(value_name = "FILE")]
        path: PathBuf,
        /// Leave ordinary output lines out of the report
        #[arg(long)]
        drop_unmatched: bool,
    },
    /// Print errors and warnings with known noise filtered out
    Summary {
        /// Path to the .log file
        #[arg(value_name = "FILE")]
        path: PathBuf,
        /// JSON file with filter patterns, replacing the built-in ones
        #[arg(long, value_name = "JSON")]
        filter: Option<PathBuf>,
        /// Show every message
        #[arg(long, conflicts_with = "filter")]
        no_filter: bool,
    },
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    schema_version: &'static str,
    summary: Tally,
    report: &'a ScanReport,
}

fn scan_file(path: &Path, config: ScannerConfig) -> anyhow::Result<ScanReport> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut scanner = LogScanner::with_config(config);
    scanner
        .process_reader(BufReader::new(file))
        .with_context(|| format!("cannot read {}", path.display()))?;
    let report = scanner.finish();

    log::debug!("{}: {}", path.display(), report);
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse {
            path,
            drop_unmatched,
        } => {
            let config = ScannerConfig {
                unmatched: if *drop_unmatched {
                    UnmatchedPolicy::Drop
                } else {
                    UnmatchedPolicy::Collect
                },
            };
            let report = scan_file(path, config)?;
            let output = ParseOutput {
                schema_version: SCHEMA_VERSION,
                summary: report.tally(),
                report: &report,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Summary {
            path,
            filter,
            no_filter,
        } => {
            let filters = match filter {
                Some(filter_path) => FilterConfig::load_from_path(filter_path)
                    .with_context(|| format!("cannot load filters from {}", filter_path.display()))?,
                None if *no_filter => FilterConfig::disabled(),
                None => FilterConfig::builtin(),
            };
            let report = scan_file(path, ScannerConfig::default())?;
            let title = path.display().to_string();
            summary::write_summary(&mut io::stdout().lock(), &title, &report, &filters)?;
        }
    }
    Ok(())
}
