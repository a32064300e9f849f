//! Collection generator CLI
//!
//! Downloads the configured image sequence and writes tiered metadata files.
//! Runs with built-in defaults when no arguments are given.

use super::config::CliConfigBuilder;
use crate::{
    download::HttpImageSource,
    pipeline::{CollectionPipeline, RunSummary, Stage},
    services::{ConsoleProgressReporter, IndicatifProgressReporter, ProgressReporter},
    tracing_config::{init_cli_tracing, spans, TracingFormat},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Instrument};

/// Collection image and metadata generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "collection-gen")]
pub struct Cli {
    /// TOML configuration file [default: built-in settings]
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Pipeline stage to run
    #[arg(long, value_enum, default_value_t = CliStage::All)]
    pub stage: CliStage,

    /// Seed for attribute selection (overrides the config file)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keep going after a failed download and report all failures at the end
    #[arg(long)]
    pub continue_on_error: bool,

    /// Do not download images that already exist in the download directory
    #[arg(long)]
    pub skip_existing: bool,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliStage {
    /// Download images, then write metadata
    All,
    /// Download images only
    Download,
    /// Write metadata only
    Metadata,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => TracingFormat::Console,
            CliLogFormat::Compact => TracingFormat::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => TracingFormat::Json,
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        let config = CliConfigBuilder::from_cli(&cli)?;
        let rendered =
            toml::to_string_pretty(&config).context("Failed to render configuration")?;
        print!("{rendered}");
        return Ok(());
    }

    let session_id =
        init_cli_tracing(cli.verbose, cli.log_format.into()).context("Failed to initialize tracing")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;
    let stage = CliConfigBuilder::stage(&cli);

    info!("Starting collection generator");
    info!(
        "Items: {} ({} one-of-one, {} edition)",
        config.num_files, config.num_one_of_one, config.num_edition
    );
    if stage.downloads() {
        info!(
            "Images: {} -> {}",
            config.image_base_url,
            config.download_dir.display()
        );
    }
    if stage.writes_metadata() {
        info!("Metadata: {}", config.output_folder.display());
    }

    let source = HttpImageSource::from_config(&config).context("Failed to create HTTP client")?;
    let reporter: Box<dyn ProgressReporter> = if cli.progress {
        Box::new(IndicatifProgressReporter::new(config.num_files))
    } else {
        Box::new(ConsoleProgressReporter::new(cli.verbose > 0))
    };

    let summary = CollectionPipeline::new(&config, &source)
        .with_reporter(reporter.as_ref())
        .run(stage)
        .instrument(spans::session(&session_id, config.num_files))
        .await
        .context("Collection run failed")?;

    print_next_steps(stage, &summary);
    Ok(())
}

fn print_next_steps(stage: Stage, summary: &RunSummary) {
    info!("Seed used for attributes: {}", summary.seed);
    match stage {
        Stage::Download => println!(
            "Download complete. Please upload the images to IPFS and set ipfs_folder in the configuration."
        ),
        Stage::Metadata | Stage::All => {
            println!("Metadata generation complete. You can now upload the metadata to IPFS.");
        },
    }
}
