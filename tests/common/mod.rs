#![allow(dead_code)]

use covreview::changes::ChangeSet;
use covreview::config::Config;
use covreview::review::{self, CollectingSink, Outcome};

/// File-level metrics as written into a `<metrics>` element, as
/// `(total, covered)` pairs.
pub struct Metrics {
    pub statements: (u64, u64),
    pub conditionals: (u64, u64),
    pub methods: (u64, u64),
}

pub const DEFAULT_METRICS: Metrics = Metrics {
    statements: (10, 10),
    conditionals: (10, 10),
    methods: (10, 10),
};

/// A `<file>` element with the given `(num, count)` statement lines.
pub fn file_xml(path: &str, metrics: &Metrics, lines: &[(u32, u64)]) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    let mut xml = format!(
        "<file name=\"{name}\" path=\"{path}\">\
         <metrics statements=\"{}\" coveredstatements=\"{}\" \
         conditionals=\"{}\" coveredconditionals=\"{}\" \
         methods=\"{}\" coveredmethods=\"{}\"/>",
        metrics.statements.0,
        metrics.statements.1,
        metrics.conditionals.0,
        metrics.conditionals.1,
        metrics.methods.0,
        metrics.methods.1,
    );
    for (num, count) in lines {
        xml.push_str(&format!("<line num=\"{num}\" count=\"{count}\" type=\"stmt\"/>"));
    }
    xml.push_str("</file>");
    xml
}

/// A fully covered file with one covered line.
pub fn covered_file(path: &str) -> String {
    file_xml(path, &DEFAULT_METRICS, &[(1, 1)])
}

/// Wrap file elements in a single-project Clover document.
pub fn wrap_report(files: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <coverage generated=\"1\" clover=\"3.2.0\">\
         <project timestamp=\"1\" name=\"All files\">{}</project></coverage>",
        files.concat()
    )
}

pub fn changes(created: &[&str], modified: &[&str]) -> ChangeSet {
    ChangeSet {
        created: created.iter().map(|s| s.to_string()).collect(),
        modified: modified.iter().map(|s| s.to_string()).collect(),
        commits: Vec::new(),
    }
}

/// Run a review over an in-memory report.
pub fn review(xml: &str, changes: &ChangeSet, config: &Config) -> (Outcome, CollectingSink) {
    let mut sink = CollectingSink::default();
    let source = Some(xml.as_bytes().to_vec());
    let outcome = review::run(config, &source, changes, &mut sink).unwrap();
    (outcome, sink)
}

/// The single rendered report of a run.
pub fn markdown(xml: &str, changes: &ChangeSet, config: &Config) -> String {
    let (_, sink) = review(xml, changes, config);
    assert_eq!(sink.reports.len(), 1, "expected exactly one report");
    sink.reports[0].clone()
}

/// Table rows of a rendered report, header and divider excluded.
pub fn rows(md: &str) -> Vec<&str> {
    md.lines()
        .filter(|l| l.starts_with('|'))
        .skip(2)
        .collect()
}
