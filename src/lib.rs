#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Collection Generator
//!
//! Downloads a fixed number of images from an indexed URL sequence and writes
//! one JSON metadata file per image, ready to be uploaded to IPFS for NFT
//! minting.
//!
//! Each item is assigned to one of two tiers, `one-of-one` or `edition`, and
//! receives a random selection of attributes drawn from a configurable trait
//! vocabulary. The random source is seeded, so reruns with the same
//! configuration produce byte-identical metadata.
//!
//! ## Features
//!
//! - **Layered configuration**: built-in defaults, TOML file, CLI overrides
//! - **Deterministic tiers**: quota-checked partition of the index range
//! - **Seeded attributes**: string list and integer range traits
//! - **Streaming downloads**: images are written through a temporary file
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use collection_gen::{generate_collection, CollectionConfig, Stage};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CollectionConfig::builder()
//!     .num_files(3)
//!     .tiers(1, 2)
//!     .ipfs_folder("ipfs://bafy.../")
//!     .seed(42)
//!     .build()?;
//!
//! let summary = generate_collection(&config, Stage::All).await?;
//! println!("wrote {} metadata files", summary.metadata_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom image sources
//!
//! Anything implementing [`ImageSource`] can feed the pipeline, which is how
//! the tests run without network access:
//!
//! ```rust,no_run
//! use collection_gen::{CollectionConfig, CollectionPipeline, ImageSource, Result, Stage};
//! use std::path::Path;
//!
//! struct Placeholder;
//!
//! #[async_trait::async_trait]
//! impl ImageSource for Placeholder {
//!     async fn download(&self, _url: &str, destination: &Path) -> Result<u64> {
//!         tokio::fs::write(destination, b"placeholder").await?;
//!         Ok(11)
//!     }
//! }
//!
//! # async fn example(config: CollectionConfig) -> collection_gen::Result<()> {
//! CollectionPipeline::new(&config, &Placeholder).run(Stage::All).await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod services;
pub mod tier;
#[cfg(feature = "cli")]
pub mod tracing_config;

// Public API exports
pub use config::{
    CollectionConfig, CollectionConfigBuilder, ErrorPolicy, TierOrder, TraitCandidates, TraitSpec,
};
pub use download::{DownloadedImage, HttpImageSource, ImageFetcher, ImageSource};
pub use error::{CollectionError, Result};
pub use metadata::{Attribute, AttributeValue, MetadataGenerator, MetadataRecord};
pub use pipeline::{CollectionPipeline, RunSummary, Stage};
pub use services::{
    ConsoleProgressReporter, MetadataWriter, NoOpProgressReporter, PipelineStage,
    ProgressReporter, ProgressUpdate,
};
pub use tier::{Tier, TierPlan};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

/// Run the pipeline against the configured HTTP image source
///
/// # Arguments
///
/// * `config` - Validated collection configuration
/// * `stage` - Which stages to run
///
/// # Returns
///
/// A [`RunSummary`] with the seed used and the number of files produced
pub async fn generate_collection(config: &CollectionConfig, stage: Stage) -> Result<RunSummary> {
    let source = HttpImageSource::from_config(config)?;
    CollectionPipeline::new(config, &source).run(stage).await
}
