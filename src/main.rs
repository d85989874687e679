use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use covreview::changes::{
    ChangeSet, ChangeSource, ExplicitChanges, GitChanges, GitHubChanges, StdinDiff,
};
use covreview::cli::{self, Style};
use covreview::config::Config;
use covreview::github::Context as GitHubContext;

/// covreview: coverage review of the files changed in a pull request.
#[derive(Parser)]
#[command(name = "covreview", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Review coverage of created and modified files.
    Review {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Created files, relative to the project root.
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        created: Vec<String>,

        /// Modified files, relative to the project root.
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        modified: Vec<String>,

        /// Commit to link files and lines against.
        #[arg(long)]
        sha: Option<String>,

        /// Take changed files from `git diff --name-status <ARGS>`
        /// (e.g. "main...HEAD").
        #[arg(long, value_name = "ARGS", conflicts_with_all = ["diff_stdin", "github"])]
        git_diff: Option<String>,

        /// Take changed files from a unified diff on stdin.
        #[arg(long, conflicts_with = "github")]
        diff_stdin: bool,

        /// Take changed files from the GitHub pull request of the current
        /// Actions run (GITHUB_TOKEN, GITHUB_REPOSITORY, GITHUB_REF).
        #[arg(long)]
        github: bool,

        /// Review every file in the report, not only changed ones.
        #[arg(long)]
        all_files: bool,

        /// Rows shown before the rest collapse into "and N more...".
        #[arg(long)]
        max_rows: Option<usize>,

        /// Longest path shown before it is shortened.
        #[arg(long)]
        max_chars: Option<usize>,

        /// Stay silent when there is no coverage report.
        #[arg(long)]
        no_warn: bool,

        /// Output format.
        #[arg(long, value_enum, default_value = "markdown")]
        format: Style,

        /// Post the review as a comment on the GitHub pull request.
        #[arg(long)]
        post_comment: bool,
    },

    /// List per-file coverage of the whole report.
    Files {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Options shared by every subcommand.
#[derive(Args)]
struct SettingsArgs {
    /// Config file (default: <root>/.covreview.json when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Project root the report paths are relative to (default: cwd).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Clover report path, relative to the root.
    #[arg(long)]
    report: Option<PathBuf>,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<Config> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let mut config = Config::discover(&root, self.config.as_deref())
            .context("Failed to load configuration")?;
        if let Some(report) = &self.report {
            config.clover_report_path = report.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Review {
            settings,
            created,
            modified,
            sha,
            git_diff,
            diff_stdin,
            github,
            all_files,
            max_rows,
            max_chars,
            no_warn,
            format,
            post_comment,
        } => {
            let mut config = settings.resolve()?;
            if all_files {
                config.show_all_files = true;
            }
            if let Some(n) = max_rows {
                config.max_rows = n;
            }
            if let Some(n) = max_chars {
                config.max_chars = n;
            }
            if no_warn {
                config.warn_on_no_report = false;
            }

            let source: Box<dyn ChangeSource> = if github {
                Box::new(GitHubChanges::from_env()?)
            } else if let Some(args) = git_diff {
                Box::new(GitChanges { args })
            } else if diff_stdin {
                Box::new(StdinDiff)
            } else {
                Box::new(ExplicitChanges(ChangeSet {
                    created,
                    modified,
                    commits: sha.into_iter().collect(),
                }))
            };
            let changes = source.fetch_changes()?;
            tracing::debug!(
                created = changes.created.len(),
                modified = changes.modified.len(),
                "resolved change-set"
            );
            if changes.is_empty() && !config.show_all_files {
                tracing::warn!("no created or modified files to review");
            }

            let output = cli::cmd_review(&config, &changes, &format)?;
            for warning in &output.warnings {
                tracing::warn!("{warning}");
            }
            for report in &output.reports {
                print!("{report}");
            }

            if post_comment {
                let body = output
                    .warnings
                    .iter()
                    .chain(&output.reports)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("\n");
                if body.is_empty() {
                    tracing::info!("nothing to post");
                } else {
                    GitHubContext::from_env()?.post_comment(&body)?;
                }
            }
        }

        Commands::Files { settings } => {
            let config = settings.resolve()?;
            print!("{}", cli::cmd_files(&config)?);
        }
    }

    Ok(())
}
