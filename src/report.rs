//! Markdown rendering of an evaluated coverage review.

use std::fmt::Write;

use crate::config::Config;
use crate::evaluate::{EvaluatedFile, Evaluation, Metric};

pub const PASS_GLYPH: &str = ":white_check_mark:";
pub const FAIL_GLYPH: &str = ":x:";
/// Placeholder for cells of a file without measurable lines.
pub const NO_DATA: &str = "-";
/// Uncovered line numbers listed per row before the list is cut short.
pub const MAX_UNCOVERED_LINES: usize = 10;

const TABLE_HEADER: &str = "|Files|% Stmts|% Branch|% Funcs|% Lines|Uncovered Lines||";
const TABLE_DIVIDER: &str = "|---|---|---|---|---|---|---|";
const LINE_BREAK: &str = "<br>";

/// Commit the rendered links point at. Present only when the change-set
/// names a commit; without it paths and line numbers render as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContext {
    sha: String,
}

impl LinkContext {
    pub fn new(sha: impl Into<String>) -> Self {
        Self { sha: sha.into() }
    }

    /// Relative link to `path` at the commit, e.g. `../blob/abc123/src/a.js`.
    #[must_use]
    pub fn file_url(&self, path: &str) -> String {
        format!("../blob/{}/{path}", self.sha)
    }
}

/// Display settings for [`render_markdown`].
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    pub success_message: String,
    pub failure_message: String,
    pub max_rows: usize,
    pub max_chars: usize,
    pub link: Option<LinkContext>,
}

impl MarkdownOptions {
    pub fn from_config(config: &Config, sha: Option<&str>) -> Self {
        Self {
            success_message: config.success_message.clone(),
            failure_message: config.failure_message.clone(),
            max_rows: config.max_rows,
            max_chars: config.max_chars,
            link: sha.map(LinkContext::new),
        }
    }
}

/// Render the review as markdown. Returns `None` when there are no rows:
/// an empty review produces no output at all.
#[must_use]
pub fn render_markdown(evaluation: &Evaluation, options: &MarkdownOptions) -> Option<String> {
    if evaluation.files.is_empty() {
        return None;
    }

    let mut md = String::new();

    let banner = if evaluation.passed {
        &options.success_message
    } else {
        &options.failure_message
    };
    writeln!(md, "> {banner}\n").unwrap();

    if !evaluation.passed {
        md.push_str("```\n");
        for failure in evaluation.failures() {
            writeln!(md, "{failure}").unwrap();
        }
        md.push_str("```\n\n");
    }

    md.push_str(TABLE_HEADER);
    md.push('\n');
    md.push_str(TABLE_DIVIDER);
    md.push('\n');

    let shown = evaluation.files.len().min(options.max_rows);
    for file in &evaluation.files[..shown] {
        md.push_str(&format_row(file, options));
        md.push('\n');
    }

    let hidden = evaluation.files.len() - shown;
    if hidden > 0 {
        md.push_str("\n<details>\n<summary>More files</summary>\n\n");
        writeln!(md, "and {hidden} more...").unwrap();
        md.push_str("</details>\n");
    }

    Some(md)
}

/// One table row: path, four percentages, uncovered lines, status.
#[must_use]
pub fn format_row(file: &EvaluatedFile, options: &MarkdownOptions) -> String {
    let display = shorten_path(&file.path, options.max_chars);
    let file_url = options.link.as_ref().map(|l| l.file_url(&file.path));

    let path_cell = match &file_url {
        Some(url) => format!("[{display}]({url})"),
        None => display,
    };

    let mut row = format!("|{path_cell}|");
    match file.percentages {
        Some(p) => {
            for metric in Metric::ALL {
                write!(row, "{}|", p.get(metric)).unwrap();
            }
            let status = if file.passed { PASS_GLYPH } else { FAIL_GLYPH };
            write!(
                row,
                "{}|{status}|",
                format_uncovered_lines(&file.uncovered_lines, file_url.as_deref())
            )
            .unwrap();
        }
        None => {
            for _ in Metric::ALL {
                write!(row, "{NO_DATA}|").unwrap();
            }
            write!(row, "|{NO_DATA}|").unwrap();
        }
    }
    row
}

/// Shorten a path that is longer than `max_chars` by dropping leading
/// segments behind a `../` marker, keeping as many trailing segments as fit.
/// Kept segments are grouped in pairs separated by `<br>` so that long cells
/// wrap. Paths within the budget are returned unchanged.
#[must_use]
pub fn shorten_path(path: &str, max_chars: usize) -> String {
    if path.chars().count() <= max_chars {
        return path.to_string();
    }

    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 2 {
        return path.to_string();
    }
    let last = segments.len() - 1;
    let fits = |start: usize| {
        let chars: usize = segments[start..].iter().map(|s| s.chars().count()).sum();
        let joined = chars + (segments.len() - start - 1);
        "../".len() + joined <= max_chars
    };
    let start = (1..=last).find(|&start| fits(start)).unwrap_or(last);

    let pairs: Vec<String> = segments[start..]
        .chunks(2)
        .map(|pair| pair.join("/"))
        .collect();
    format!("../{}", pairs.join(&format!("/{LINE_BREAK}")))
}

/// Comma-separated uncovered lines, at most [`MAX_UNCOVERED_LINES`] of them
/// followed by `...` when cut short. With a file URL each number links to
/// its line anchor.
#[must_use]
pub fn format_uncovered_lines(lines: &[u32], file_url: Option<&str>) -> String {
    let shown = lines.len().min(MAX_UNCOVERED_LINES);
    let mut out = lines[..shown]
        .iter()
        .map(|&n| match file_url {
            Some(url) => format!("[{n}]({url}#L{n})"),
            None => n.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    if lines.len() > MAX_UNCOVERED_LINES {
        out.push_str("...");
    }
    out
}
