//! Command execution
//!
//! Wires the pipeline together: config → destination check → crawl →
//! finalize → split → upload. Configuration problems abort before any
//! crawl work; everything later degrades to a partial export instead of
//! failing the run.

use super::commands::{Cli, Commands};
use crate::config::{ExportConfig, ModuleFilter};
use crate::crawl::Crawler;
use crate::error::Result;
use crate::http::HttpClient;
use crate::sink::ExportSink;
use crate::split::split_file;
use crate::types::RunContext;
use crate::upload::{Destination, UploadDispatcher};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Executes a parsed CLI invocation
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a runner for a parsed CLI
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Dispatch to the selected command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run {
                modules,
                max_records,
                destination,
                skip_upload,
            } => {
                let mut config = self.load_config()?;
                if let Some(list) = modules {
                    config.modules = parse_module_override(list);
                }
                if let Some(max) = max_records {
                    config.max_records = Some(*max);
                }
                if let Some(dest) = destination {
                    config.destination = Some(dest.clone());
                }
                self.run_pipeline(config, *skip_upload).await
            }
            Commands::Modules => self.list_modules().await,
            Commands::Split { file, lines, dest } => {
                let dest = dest.clone().unwrap_or_else(|| {
                    file.parent()
                        .map_or_else(|| PathBuf::from("split"), |p| p.join("split"))
                });
                let chunks = split_file(file, *lines, &dest)?;
                println!(
                    "Split {} into {} chunk(s) under {}",
                    file.display(),
                    chunks.len(),
                    dest.display()
                );
                Ok(())
            }
            Commands::Validate => {
                let config = self.load_config()?;
                config.validate()?;
                if let Some(url) = &config.destination {
                    let destination = Destination::parse(url)?;
                    destination.verify().await?;
                }
                println!("Configuration OK");
                Ok(())
            }
        }
    }

    /// Load the config file, or fall back to defaults plus environment
    /// when the default path does not exist.
    fn load_config(&self) -> Result<ExportConfig> {
        if self.cli.config.exists() {
            debug!("Loading configuration from {}", self.cli.config.display());
            ExportConfig::load(&self.cli.config)
        } else {
            debug!(
                "Config file {} not found, using defaults and environment",
                self.cli.config.display()
            );
            let mut config = ExportConfig::default();
            config.apply_env();
            Ok(config)
        }
    }

    /// The full crawl-export-split-upload pipeline
    async fn run_pipeline(&self, config: ExportConfig, skip_upload: bool) -> Result<()> {
        config.validate()?;

        // Fail fast on an unreachable destination before crawling anything
        let dispatcher = if skip_upload {
            None
        } else {
            let url = config.destination.as_deref().unwrap_or_default();
            let destination = Destination::parse(url)?;
            destination.verify().await?;
            Some(UploadDispatcher::new(destination, &config.upload))
        };

        let run = RunContext::start();
        info!("Run {} started at {}", run.dir_name(), run.display_time());

        let config = Arc::new(config);
        let client = Arc::new(HttpClient::from_settings(&config.http)?);
        let sink = Arc::new(Mutex::new(ExportSink::new(
            config.file_type.clone(),
            config.include_module_name,
        )?));

        let crawler = Crawler::new(client, Arc::clone(&config));
        let stats = crawler.crawl(Arc::clone(&sink)).await?;
        let files = sink.lock().await.finalize()?;

        if files.is_empty() {
            warn!("Run {} produced no records; nothing to upload", run.dir_name());
            return Ok(());
        }

        // Chunk each finalized sink under <output_dir>/<run>/<sink_name>/
        let run_root = config.output_dir.join(run.dir_name());
        let mut chunk_count = 0;
        for file in &files {
            let dest = run_root.join(&file.name);
            let chunks = split_file(&file.path, config.lines_per_file, &dest)?;
            debug!(
                "Sink {}: {} line(s) into {} chunk(s)",
                file.name,
                file.lines,
                chunks.len()
            );
            chunk_count += chunks.len();
        }
        info!(
            "Exported {} record(s) into {} chunk file(s) under {}",
            stats.live_records + stats.deleted_records,
            chunk_count,
            run_root.display()
        );

        if let Some(dispatcher) = dispatcher {
            let uploaded = dispatcher.upload_dir(&run_root, &run.dir_name()).await?;
            if uploaded.failed > 0 {
                warn!(
                    "Run {} finished with {} failed upload(s)",
                    run.dir_name(),
                    uploaded.failed
                );
            }
        } else {
            info!("Upload skipped; output kept under {}", run_root.display());
        }

        Ok(())
    }

    /// Discovery-only listing
    async fn list_modules(&self) -> Result<()> {
        let mut config = self.load_config()?;
        config.apply_env();
        config.require_auth_token()?;

        let config = Arc::new(config);
        let client = Arc::new(HttpClient::from_settings(&config.http)?);
        let crawler = Crawler::new(client, Arc::clone(&config));

        let modules = crawler.discover().await?;
        println!("{} module(s):", modules.len());
        for module in modules {
            let allowed = if config.modules.allows(&module.name) {
                ""
            } else {
                "  (filtered out)"
            };
            println!("  {:>3}  {}{allowed}", module.number, module.name);
        }
        Ok(())
    }
}

/// Parse a `--modules` override: `ALL`, one name, or a comma-separated list
fn parse_module_override(list: &str) -> ModuleFilter {
    let names: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    match names.len() {
        1 => ModuleFilter::One(names.into_iter().next().unwrap_or_default()),
        _ => ModuleFilter::Many(names),
    }
}
