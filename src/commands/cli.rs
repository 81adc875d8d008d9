//! Command-line surface.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::config::{AppConfig, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS};
use crate::error::AppError;

#[derive(Debug, Parser)]
#[command(
    name = "question-import",
    version,
    about = "Bulk CSV/JSON question import for the exam admin API"
)]
pub struct Cli {
    #[command(flatten)]
    pub api: ApiArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection settings shared by every networked command.
#[derive(Debug, Clone, Args)]
pub struct ApiArgs {
    /// Base URL of the platform API, e.g. https://exams.example.com
    #[arg(long, env = "QUESTION_IMPORT_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token attached to every request
    #[arg(long, env = "QUESTION_IMPORT_API_TOKEN", hide_env_values = true, global = true)]
    pub api_token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "QUESTION_IMPORT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    /// Maximum in-flight create requests on the JSON path (1-8)
    #[arg(long, env = "QUESTION_IMPORT_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY, global = true)]
    pub concurrency: usize,

    /// Pause before scanning, in milliseconds
    #[arg(long, env = "QUESTION_IMPORT_SCAN_DELAY_MS", default_value_t = 0, global = true)]
    pub scan_delay_ms: u64,
}

impl ApiArgs {
    /// Builds and validates an `AppConfig`.
    ///
    /// # Errors
    ///
    /// `AppError::Config` if no URL was given or a value is out of range.
    pub fn to_config(&self) -> Result<AppConfig, AppError> {
        let raw = self.api_url.as_deref().ok_or_else(|| {
            AppError::Config("API URL is required (--api-url or QUESTION_IMPORT_API_URL)".into())
        })?;
        let url = Url::parse(raw).map_err(|e| AppError::Config(format!("Invalid API URL: {}", e)))?;

        let mut config = AppConfig::new(url);
        if let Some(token) = &self.api_token {
            config = config.with_token(token.as_str());
        }
        config.timeout_secs = self.timeout_secs;
        config.concurrency = self.concurrency;
        config.scan_delay_ms = self.scan_delay_ms;
        config.validate()?;
        Ok(config)
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import questions from a 9-column CSV file
    Csv {
        file: PathBuf,
        /// Scan and preview only; nothing is sent
        #[arg(long)]
        dry_run: bool,
    },

    /// Import questions from a JSON file, or from stdin with `-`
    Json {
        file: PathBuf,
        /// Category id
        #[arg(long)]
        category: Option<String>,
        /// Subject id
        #[arg(long)]
        subject: Option<String>,
        /// Question group id
        #[arg(long)]
        group: Option<String>,
        /// Scan and preview only; nothing is sent
        #[arg(long)]
        dry_run: bool,
    },

    /// List active categories, subjects or question groups
    Taxonomy {
        #[command(subcommand)]
        level: TaxonomyLevel,
    },

    /// Write the sample CSV
    SampleCsv {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the demo JSON
    DemoJson {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export existing questions to CSV
    Export {
        /// Export every question
        #[arg(long, conflicts_with = "ids", required_unless_present = "ids")]
        all: bool,
        /// Comma-separated question ids
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TaxonomyLevel {
    Categories,
    Subjects {
        #[arg(long)]
        category: String,
    },
    Groups {
        #[arg(long)]
        subject: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("question-import").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn json_command_takes_taxonomy_ids() {
        let cli = parse(&[
            "json", "-", "--category", "c1", "--subject", "s1", "--group", "g1", "--api-url",
            "http://localhost:3000",
        ]);
        match cli.command {
            Command::Json { file, category, group, dry_run, .. } => {
                assert_eq!(file, PathBuf::from("-"));
                assert_eq!(category.as_deref(), Some("c1"));
                assert_eq!(group.as_deref(), Some("g1"));
                assert!(!dry_run);
            }
            other => panic!("Expected Json, got: {:?}", other),
        }
        assert_eq!(cli.api.to_config().unwrap().api_url.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn export_ids_are_comma_separated() {
        let cli = parse(&["export", "--ids", "a,b"]);
        match cli.command {
            Command::Export { all, ids, .. } => {
                assert!(!all);
                assert_eq!(ids, vec!["a", "b"]);
            }
            other => panic!("Expected Export, got: {:?}", other),
        }
    }

    #[test]
    fn export_requires_a_selection() {
        let result = Cli::try_parse_from(["question-import", "export"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_requires_url_and_valid_concurrency() {
        let mut args = ApiArgs {
            api_url: None,
            api_token: None,
            timeout_secs: 30,
            concurrency: 1,
            scan_delay_ms: 0,
        };
        assert!(matches!(args.to_config(), Err(AppError::Config(_))));

        args.api_url = Some("https://exams.example.com".into());
        args.concurrency = 9;
        assert!(matches!(args.to_config(), Err(AppError::Config(_))));

        args.concurrency = 4;
        args.api_token = Some("   ".into());
        let config = args.to_config().unwrap();
        assert_eq!(config.concurrency, 4);
        assert!(config.api_token.is_none());
    }
}
