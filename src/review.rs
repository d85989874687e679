//! The review pipeline: parse → select → evaluate → render, handing the
//! result to a host sink.

use crate::changes::ChangeSet;
use crate::config::{self, Config};
use crate::error::Result;
use crate::evaluate::{self, Evaluation};
use crate::filter;
use crate::ingest::{self, ReportSource};
use crate::model::CoverageDocument;
use crate::report::{self, MarkdownOptions};

/// Warning handed to the host when no report exists.
pub const NO_REPORT_WARNING: &str = "No coverage report was detected. \
     Please output a report in the `clover` format before running the coverage review.";

/// Where the host receives the output of a run.
pub trait ReviewSink {
    fn warn(&mut self, message: &str);
    fn markdown(&mut self, report: &str);
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No report at the configured location.
    MissingReport,
    /// The report covers none of the changed files.
    NoMatchingFiles,
    /// A report was rendered and handed to the sink.
    Report(String),
}

/// Evaluate a parsed document against the change-set. `None` when no
/// changed file is covered by the report.
pub fn evaluate_document(
    doc: &CoverageDocument,
    changes: &ChangeSet,
    config: &Config,
) -> Result<Option<Evaluation>> {
    let root = config::absolute_root(&config.root)?;
    let selection = filter::select(doc, changes, &root, config.show_all_files);
    if selection.is_empty() {
        return Ok(None);
    }
    Ok(Some(evaluate::evaluate(&selection, &config.threshold)))
}

/// Load the report and evaluate it. A missing report is announced through
/// the sink here, so every output format warns the same way.
pub fn evaluate_source(
    config: &Config,
    source: &dyn ReportSource,
    changes: &ChangeSet,
    sink: &mut dyn ReviewSink,
) -> Result<std::result::Result<Evaluation, Outcome>> {
    let Some(doc) = ingest::load_document(source)? else {
        if config.warn_on_no_report {
            sink.warn(NO_REPORT_WARNING);
        }
        return Ok(Err(Outcome::MissingReport));
    };

    match evaluate_document(&doc, changes, config)? {
        Some(evaluation) => Ok(Ok(evaluation)),
        None => {
            tracing::info!("no changed files found in the coverage report");
            Ok(Err(Outcome::NoMatchingFiles))
        }
    }
}

/// Run one review. Only a failed read or a malformed report is an error;
/// every "nothing to say" case is a normal [`Outcome`].
pub fn run(
    config: &Config,
    source: &dyn ReportSource,
    changes: &ChangeSet,
    sink: &mut dyn ReviewSink,
) -> Result<Outcome> {
    let evaluation = match evaluate_source(config, source, changes, sink)? {
        Ok(evaluation) => evaluation,
        Err(outcome) => return Ok(outcome),
    };

    let options = MarkdownOptions::from_config(config, changes.head_sha());
    match report::render_markdown(&evaluation, &options) {
        Some(md) => {
            tracing::info!(
                files = evaluation.total,
                passed = evaluation.passed,
                "coverage review rendered"
            );
            sink.markdown(&md);
            Ok(Outcome::Report(md))
        }
        None => Ok(Outcome::NoMatchingFiles),
    }
}

/// A sink that keeps everything it is given.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub warnings: Vec<String>,
    pub reports: Vec<String>,
}

impl ReviewSink for CollectingSink {
    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn markdown(&mut self, report: &str) {
        self.reports.push(report.to_string());
    }
}
