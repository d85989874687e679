//! Command handler functions for the covreview CLI.
//!
//! Each `cmd_*` function returns its output instead of printing it, making
//! them easy to test without capturing stdout.

use std::fmt::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::changes::ChangeSet;
use crate::config::Config;
use crate::evaluate::{self, Metric};
use crate::ingest::{self, FileReport};
use crate::review::{self, CollectingSink, ReviewSink};

/// Output style for the `review` command.
#[derive(Clone, Debug, ValueEnum)]
pub enum Style {
    Markdown,
    Json,
}

/// Run a review against the configured report location.
pub fn cmd_review(config: &Config, changes: &ChangeSet, style: &Style) -> Result<CollectingSink> {
    let source = FileReport::new(config.report_path());
    let mut sink = CollectingSink::default();

    match style {
        Style::Markdown => {
            review::run(config, &source, changes, &mut sink).with_context(|| {
                format!("Failed to review {}", source.path().display())
            })?;
        }
        Style::Json => {
            let evaluated = review::evaluate_source(config, &source, changes, &mut sink)
                .with_context(|| format!("Failed to review {}", source.path().display()))?;
            if let Ok(evaluation) = evaluated {
                let json =
                    serde_json::to_string_pretty(&evaluation).context("Failed to serialize review")?;
                sink.markdown(&format!("{json}\n"));
            }
        }
    }

    Ok(sink)
}

/// List every file of the report with its four percentages.
pub fn cmd_files(config: &Config) -> Result<String> {
    let path = config.report_path();
    let doc = ingest::load_document(&FileReport::new(&path))
        .with_context(|| format!("Failed to read {}", path.display()))?
        .with_context(|| format!("No coverage report at {}", path.display()))?;

    let mut out = String::new();
    writeln!(
        out,
        "{:<60} {:>8} {:>8} {:>8} {:>8}",
        "FILE", "STMTS", "BRANCH", "FUNCS", "LINES"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(96)).unwrap();

    for record in &doc.files {
        let display = crate::filter::normalize_path(&record.path, &config.root);
        let cells: Vec<String> = match evaluate::percentages(record) {
            Some(p) => Metric::ALL
                .iter()
                .map(|&m| format!("{}%", p.get(m)))
                .collect(),
            None => vec!["-".to_string(); 4],
        };
        writeln!(
            out,
            "{:<60} {:>8} {:>8} {:>8} {:>8}",
            display, cells[0], cells[1], cells[2], cells[3]
        )
        .unwrap();
    }

    Ok(out)
}
