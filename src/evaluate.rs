//! Per-file percentages, threshold verdicts and uncovered-line listings.

use std::fmt;

use serde::Serialize;

use crate::config::Thresholds;
use crate::filter::{MatchedFile, Selection};
use crate::model::{format_number, FileRecord, Percentage};

/// The four metrics a file is judged on, in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Statements,
    Branches,
    Functions,
    Lines,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Statements,
        Metric::Branches,
        Metric::Functions,
        Metric::Lines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Statements => "statements",
            Metric::Branches => "branches",
            Metric::Functions => "functions",
            Metric::Lines => "lines",
        }
    }

    fn threshold(self, thresholds: &Thresholds) -> f64 {
        match self {
            Metric::Statements => thresholds.statements,
            Metric::Branches => thresholds.branches,
            Metric::Functions => thresholds.functions,
            Metric::Lines => thresholds.lines,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentages of a file that has at least one measurable line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilePercentages {
    pub statements: Percentage,
    pub branches: Percentage,
    pub functions: Percentage,
    pub lines: Percentage,
}

impl FilePercentages {
    #[must_use]
    pub fn get(&self, metric: Metric) -> Percentage {
        match metric {
            Metric::Statements => self.statements,
            Metric::Branches => self.branches,
            Metric::Functions => self.functions,
            Metric::Lines => self.lines,
        }
    }
}

/// A metric that fell below its threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricFailure {
    pub metric: Metric,
    pub threshold: f64,
    pub actual: Percentage,
}

impl fmt::Display for MetricFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Coverage threshold for {} ({}%) not met: {}%",
            self.metric,
            format_number(self.threshold),
            self.actual
        )
    }
}

/// A changed file after evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedFile {
    /// Repository-relative path.
    pub path: String,
    /// `None` when the file has no measurable lines ("no data").
    pub percentages: Option<FilePercentages>,
    /// Ascending, de-duplicated numbers of uncovered measurable lines.
    pub uncovered_lines: Vec<u32>,
    pub failures: Vec<MetricFailure>,
    pub passed: bool,
}

impl EvaluatedFile {
    #[must_use]
    pub fn percentage(&self, metric: Metric) -> Option<Percentage> {
        self.percentages.map(|p| p.get(metric))
    }
}

/// Compute the four percentages of a record. Lines is the only metric
/// without a fallback: no measurable lines means no data at all.
#[must_use]
pub fn percentages(record: &FileRecord) -> Option<FilePercentages> {
    let (total, covered) = record
        .measurable_lines()
        .fold((0u64, 0u64), |(total, covered), line| {
            (total + 1, covered + u64::from(line.hit_count > 0))
        });
    if total == 0 {
        return None;
    }

    let m = &record.metrics;
    Some(FilePercentages {
        statements: Percentage::from_ratio(m.covered_statements, m.statements),
        branches: Percentage::from_ratio(m.covered_conditionals, m.conditionals),
        functions: Percentage::from_ratio(m.covered_methods, m.methods),
        lines: Percentage::from_ratio(covered, total),
    })
}

/// Numbers of measurable lines with a zero hit count, ascending and unique.
#[must_use]
pub fn uncovered_lines(record: &FileRecord) -> Vec<u32> {
    let mut lines: Vec<u32> = record
        .measurable_lines()
        .filter(|l| l.hit_count == 0)
        .map(|l| l.number)
        .collect();
    lines.sort_unstable();
    lines.dedup();
    lines
}

/// Evaluate one selected file against the thresholds.
#[must_use]
pub fn evaluate_file(file: &MatchedFile<'_>, thresholds: &Thresholds) -> EvaluatedFile {
    let percentages = percentages(file.record);

    let failures: Vec<MetricFailure> = match percentages {
        Some(p) => Metric::ALL
            .iter()
            .filter_map(|&metric| {
                let threshold = metric.threshold(thresholds);
                let actual = p.get(metric);
                (actual.value() < threshold).then_some(MetricFailure {
                    metric,
                    threshold,
                    actual,
                })
            })
            .collect(),
        None => Vec::new(),
    };

    EvaluatedFile {
        path: file.path.to_string(),
        percentages,
        uncovered_lines: uncovered_lines(file.record),
        passed: failures.is_empty(),
        failures,
    }
}

/// All evaluated files of a review plus the aggregate verdict.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub passed: bool,
    pub total: usize,
    pub files: Vec<EvaluatedFile>,
}

impl Evaluation {
    /// Every failing-metric diagnostic, in row order.
    pub fn failures(&self) -> impl Iterator<Item = &MetricFailure> {
        self.files.iter().flat_map(|f| f.failures.iter())
    }
}

/// Evaluate every selected file. The run passes only if every row does,
/// including rows that will not fit in the rendered table.
#[must_use]
pub fn evaluate(selection: &Selection<'_>, thresholds: &Thresholds) -> Evaluation {
    let files: Vec<EvaluatedFile> = selection
        .files
        .iter()
        .map(|f| evaluate_file(f, thresholds))
        .collect();
    let passed = files.iter().all(|f| f.passed);

    tracing::debug!(
        files = files.len(),
        failing = files.iter().filter(|f| !f.passed).count(),
        passed,
        "evaluated coverage"
    );

    Evaluation {
        passed,
        total: selection.total(),
        files,
    }
}
