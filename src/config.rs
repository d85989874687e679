use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};

/// Config file looked up under the root when `--config` is not given.
pub const CONFIG_FILE: &str = ".covreview.json";
/// Report location used when none is configured.
pub const DEFAULT_REPORT_PATH: &str = "coverage/clover.xml";
pub const DEFAULT_SUCCESS_MESSAGE: &str = ":+1: Test coverage is looking good.";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Test coverage is looking a little low for the files \
     created or modified in this PR, perhaps we need to improve this.";
pub const DEFAULT_THRESHOLD: f64 = 80.0;
pub const DEFAULT_MAX_ROWS: usize = 3;
pub const DEFAULT_MAX_CHARS: usize = 100;

/// Run configuration. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Location of the Clover report, relative to `root` unless absolute.
    pub clover_report_path: PathBuf,
    pub success_message: String,
    pub failure_message: String,
    pub threshold: Thresholds,
    /// Rows shown in the table before the rest collapse into "N more".
    pub max_rows: usize,
    /// Path width before shortening kicks in.
    pub max_chars: usize,
    /// Report every file in the coverage report, ignoring the change-set.
    pub show_all_files: bool,
    pub warn_on_no_report: bool,
    /// Directory absolute report paths are made relative to. Injected by
    /// the caller, never read from a config file.
    #[serde(skip)]
    pub root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clover_report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
            threshold: Thresholds::default(),
            max_rows: DEFAULT_MAX_ROWS,
            max_chars: DEFAULT_MAX_CHARS,
            show_all_files: false,
            warn_on_no_report: true,
            root: PathBuf::new(),
        }
    }
}

/// Minimum percentage per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub statements: f64,
    pub branches: f64,
    pub functions: f64,
    pub lines: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            statements: DEFAULT_THRESHOLD,
            branches: DEFAULT_THRESHOLD,
            functions: DEFAULT_THRESHOLD,
            lines: DEFAULT_THRESHOLD,
        }
    }
}

impl Config {
    /// Parse a JSON config document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)
            .map_err(|e| ReviewError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReviewError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Load `explicit` if given, else `<root>/.covreview.json` if it exists,
    /// else defaults. `root` is made absolute and set on the result either way.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let root = absolute_root(root)?;
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let candidate = root.join(CONFIG_FILE);
                if candidate.is_file() {
                    tracing::debug!(path = %candidate.display(), "using config file");
                    Self::load(&candidate)?
                } else {
                    Self::default()
                }
            }
        };
        config.root = root;
        Ok(config)
    }

    /// The report location, resolved against `root`.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.root.join(&self.clover_report_path)
    }

    fn validate(&self) -> Result<()> {
        let t = &self.threshold;
        for (name, value) in [
            ("statements", t.statements),
            ("branches", t.branches),
            ("functions", t.functions),
            ("lines", t.lines),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ReviewError::Config(format!(
                    "threshold for {name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Resolve `root` against the working directory and fold away `.` and `..`
/// so it can be stripped from the absolute paths of a report.
pub fn absolute_root(root: &Path) -> Result<PathBuf> {
    let joined = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()?.join(root)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.clover_report_path, PathBuf::from("coverage/clover.xml"));
        assert_eq!(config.threshold.statements, 80.0);
        assert_eq!(config.threshold.lines, 80.0);
        assert_eq!(config.max_rows, 3);
        assert_eq!(config.max_chars, 100);
        assert!(!config.show_all_files);
        assert!(config.warn_on_no_report);
    }

    #[test]
    fn test_from_json_partial() {
        let config = Config::from_json(
            r#"{
                "successMessage": "All good",
                "threshold": { "lines": 50 },
                "maxRows": 2,
                "showAllFiles": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.success_message, "All good");
        assert_eq!(config.failure_message, DEFAULT_FAILURE_MESSAGE);
        assert_eq!(config.threshold.lines, 50.0);
        assert_eq!(config.threshold.branches, 80.0);
        assert_eq!(config.max_rows, 2);
        assert!(config.show_all_files);
    }

    #[test]
    fn test_from_json_empty_object() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_from_json_rejects_unknown_field() {
        let err = Config::from_json(r#"{ "maxRowz": 2 }"#).unwrap_err();
        assert!(matches!(err, ReviewError::Config(_)));
    }

    #[test]
    fn test_from_json_rejects_negative_threshold() {
        let err = Config::from_json(r#"{ "threshold": { "branches": -1 } }"#).unwrap_err();
        assert!(err.to_string().contains("branches"), "{err}");
    }

    #[test]
    fn test_report_path_relative_and_absolute() {
        let mut config = Config {
            root: PathBuf::from("/repo"),
            ..Config::default()
        };
        assert_eq!(config.report_path(), PathBuf::from("/repo/coverage/clover.xml"));
        config.clover_report_path = PathBuf::from("/tmp/clover.xml");
        assert_eq!(config.report_path(), PathBuf::from("/tmp/clover.xml"));
    }

    #[test]
    fn test_discover_reads_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "maxChars": 10 }"#).unwrap();

        let config = Config::discover(dir.path(), None).unwrap();
        assert_eq!(config.max_chars, 10);
        assert_eq!(config.root, dir.path());
    }

    #[test]
    fn test_from_json_rejects_unknown_threshold() {
        let err = Config::from_json(r#"{ "threshold": { "line": 50 } }"#).unwrap_err();
        assert!(matches!(err, ReviewError::Config(_)));
    }

    #[test]
    fn test_absolute_root() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute_root(Path::new(".")).unwrap(), cwd);
        assert_eq!(absolute_root(Path::new("src/..")).unwrap(), cwd);
        assert_eq!(
            absolute_root(Path::new("..")).unwrap(),
            cwd.parent().unwrap()
        );
        assert_eq!(
            absolute_root(Path::new("/repo/./a/../b")).unwrap(),
            PathBuf::from("/repo/b")
        );
    }

    #[test]
    fn test_discover_makes_relative_root_absolute() {
        let config = Config::discover(Path::new("."), None).unwrap();
        assert!(config.root.is_absolute());
        assert_eq!(config.root, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_discover_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::discover(dir.path(), None).unwrap();
        assert_eq!(config.max_chars, DEFAULT_MAX_CHARS);
    }
}
