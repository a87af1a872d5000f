//! Zoho CRM exporter CLI
//!
//! Crawls the paginated CRM API, exports per-module JSON-lines files,
//! splits them into chunks, and uploads the run to an object store.

use clap::Parser;
use zoho_export::cli::{Cli, Runner};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
