use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use question_import::commands::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // .env is optional

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let presentation = e.to_presentation();
            eprintln!("{}: {}", presentation.title, presentation.message);
            if let Some(action) = presentation.action {
                eprintln!("  → {}", action);
            }
            ExitCode::FAILURE
        }
    }
}
