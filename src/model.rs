//! In-memory representation of a parsed Clover report. The parser produces a
//! `CoverageDocument`; everything downstream works on these records and never
//! touches the XML again.

use std::fmt;

use serde::{Serialize, Serializer};

/// Instrumentation kind of a `<line>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Statement,
    Condition,
    Method,
    Other(String),
}

impl LineKind {
    /// Map a Clover `type` attribute to a kind. A missing attribute is
    /// treated as a plain statement.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            None | Some("stmt") => LineKind::Statement,
            Some("cond") => LineKind::Condition,
            Some("method") => LineKind::Method,
            Some(other) => LineKind::Other(other.to_string()),
        }
    }

    /// Only statement lines count toward the lines percentage and the
    /// uncovered-line listing.
    #[must_use]
    pub fn is_measurable(&self) -> bool {
        matches!(self, LineKind::Statement)
    }
}

/// A single instrumented source line.
#[derive(Debug, Clone)]
pub struct LineRecord {
    pub number: u32,
    pub hit_count: u64,
    pub kind: LineKind,
}

/// The six counters of a file-level `<metrics>` element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileMetrics {
    pub statements: u64,
    pub covered_statements: u64,
    pub conditionals: u64,
    pub covered_conditionals: u64,
    pub methods: u64,
    pub covered_methods: u64,
}

/// Coverage data for a single source file.
#[derive(Debug, Clone, Default)]
pub struct FileRecord {
    /// Path as declared by the report, absolute or relative.
    pub path: String,
    /// Informational basename from the `name` attribute.
    pub name: Option<String>,
    pub metrics: FileMetrics,
    /// Lines in document order.
    pub lines: Vec<LineRecord>,
}

impl FileRecord {
    pub fn new(path: String) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    pub fn measurable_lines(&self) -> impl Iterator<Item = &LineRecord> {
        self.lines.iter().filter(|l| l.kind.is_measurable())
    }
}

/// The complete result of parsing a Clover report. Files from every
/// `<project>` and `<package>` group are flattened in document order.
#[derive(Debug, Clone, Default)]
pub struct CoverageDocument {
    pub files: Vec<FileRecord>,
}

/// A coverage percentage held as an integer count of hundredths, so that
/// rounding happens exactly once and display never drifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percentage(u64);

impl Percentage {
    pub const FULL: Percentage = Percentage(10_000);

    /// `covered / total * 100` rounded half-up to two decimals. An empty
    /// denominator counts as fully covered.
    #[must_use]
    pub fn from_ratio(covered: u64, total: u64) -> Self {
        if total == 0 {
            return Self::FULL;
        }
        let scaled = u128::from(covered) * 10_000;
        let total = u128::from(total);
        let hundredths = (scaled * 2 + total) / (total * 2);
        Percentage(u64::try_from(hundredths).unwrap_or(u64::MAX))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{whole}")
        } else if frac % 10 == 0 {
            write!(f, "{whole}.{}", frac / 10)
        } else {
            write!(f, "{whole}.{frac:02}")
        }
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

/// Format an arbitrary number the way percentages are displayed: at most two
/// decimals, trailing zeros trimmed.
#[must_use]
pub fn format_number(value: f64) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
