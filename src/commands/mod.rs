//! Command handlers.
//!
//! Each subcommand of the CLI maps to one handler here; `run` dispatches.

pub mod catalog;
pub mod cli;
pub mod import;

use crate::api::ExportSelection;
use crate::error::AppError;

pub use cli::{ApiArgs, Cli, Command, TaxonomyLevel};
pub use import::TaxonomyArgs;

/// Runs the parsed command line.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    let api = &cli.api;
    match cli.command {
        Command::Csv { file, dry_run } => import::import_csv(api, &file, dry_run).await,
        Command::Json {
            file,
            category,
            subject,
            group,
            dry_run,
        } => {
            let taxonomy = TaxonomyArgs {
                category,
                subject,
                group,
            };
            import::import_json(api, &file, &taxonomy, dry_run).await
        }
        Command::Taxonomy { level } => catalog::list_taxonomy(api, &level).await,
        Command::SampleCsv { output } => catalog::sample_csv(output.as_deref()),
        Command::DemoJson { output } => catalog::demo_json(output.as_deref()),
        Command::Export { all, ids, output } => {
            let selection = if all {
                ExportSelection::All
            } else {
                ExportSelection::Ids(ids)
            };
            catalog::export(api, selection, output.as_deref()).await
        }
    }
}
