//! Collection pipeline
//!
//! This module provides the [`CollectionPipeline`] that drives a run: for each
//! index in order it fetches the image, generates the metadata record and
//! writes it. Image requests may overlap (`max_concurrent_downloads`), but
//! results are consumed in index order so the random source and the output
//! files see the same sequence as a sequential run. When a run halts, fetches
//! already in flight are allowed to finish and their images are removed, so
//! the files on disk match what a sequential run would have left.

use crate::{
    config::{CollectionConfig, ErrorPolicy, MAX_SEED},
    download::{DownloadedImage, ImageFetcher, ImageSource},
    error::{CollectionError, Result},
    metadata::MetadataGenerator,
    services::{MetadataWriter, NoOpProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate},
};
use futures::stream::{self, Stream, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Which parts of the pipeline to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Fetch images and write metadata
    #[default]
    All,
    /// Only fetch images
    Download,
    /// Only write metadata
    Metadata,
}

impl Stage {
    #[must_use]
    pub fn downloads(self) -> bool {
        matches!(self, Self::All | Self::Download)
    }

    #[must_use]
    pub fn writes_metadata(self) -> bool {
        matches!(self, Self::All | Self::Metadata)
    }
}

/// Outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Seed the attribute generator was started from
    pub seed: u64,
    pub images_downloaded: usize,
    /// Images left in place because of `skip_existing`
    pub images_skipped: usize,
    pub metadata_written: usize,
    /// Indices whose image could not be fetched
    pub failed: Vec<usize>,
    pub elapsed_ms: u64,
}

/// Drives fetch → generate → write for every index
pub struct CollectionPipeline<'a> {
    config: &'a CollectionConfig,
    source: &'a dyn ImageSource,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> CollectionPipeline<'a> {
    /// Create a silent pipeline over a validated configuration
    pub fn new(config: &'a CollectionConfig, source: &'a dyn ImageSource) -> Self {
        Self {
            config,
            source,
            reporter: &NoOpProgressReporter,
        }
    }

    /// Send progress to `reporter`
    #[must_use]
    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run the selected stages over `0..num_files`
    ///
    /// # Errors
    /// - invalid configuration
    /// - a fetch failure under `ErrorPolicy::Halt`; earlier outputs stay on disk
    /// - any metadata write failure
    /// - `CollectionError::Batch` when failures were collected under `ErrorPolicy::Continue`
    #[instrument(skip(self), fields(num_files = self.config.num_files))]
    pub async fn run(&self, stage: Stage) -> Result<RunSummary> {
        self.config.validate()?;

        let start_time = Instant::now();
        let seed = self
            .config
            .seed
            .unwrap_or_else(|| rand::rng().random_range(0..=MAX_SEED));
        info!(seed, ?stage, "Starting collection run");

        let mut rng = StdRng::seed_from_u64(seed);
        let generator = MetadataGenerator::new(self.config);
        let writer = MetadataWriter::new(self.config);
        let fetcher = ImageFetcher::new(self.config, self.source);

        if stage.downloads() {
            fetcher.prepare()?;
        }
        if stage.writes_metadata() {
            std::fs::create_dir_all(&self.config.output_folder).map_err(|e| {
                CollectionError::file_io_error(
                    "create output directory",
                    &self.config.output_folder,
                    &e,
                )
            })?;
        }

        let total = self.config.num_files;
        let mut summary = RunSummary {
            seed,
            ..RunSummary::default()
        };

        let fetcher = &fetcher;
        let halted = AtomicBool::new(false);
        let halted = &halted;
        let mut fetches = std::pin::pin!(stream::iter(0..total)
            .map(move |index| async move {
                let fetched = if stage.downloads() && !halted.load(Ordering::Acquire) {
                    Some(fetcher.fetch(index).await)
                } else {
                    None
                };
                (index, fetched)
            })
            .buffered(self.config.max_concurrent_downloads));

        let mut completed = 0;
        while let Some((index, fetched)) = fetches.next().await {
            completed += 1;

            match fetched {
                Some(Ok(image)) => {
                    Self::record_image(&mut summary, &image);
                    self.reporter.report_progress(ProgressUpdate::new(
                        PipelineStage::Download,
                        index,
                        completed,
                        total,
                        start_time,
                    ));
                },
                Some(Err(e)) => {
                    self.reporter
                        .report_error(PipelineStage::Download, index, &e.to_string());
                    match self.config.error_policy {
                        ErrorPolicy::Halt => {
                            Self::discard_in_flight(&mut fetches, halted).await;
                            summary.failed.push(index);
                            summary.elapsed_ms = start_time.elapsed().as_millis() as u64;
                            self.reporter.report_completion(&summary);
                            return Err(e);
                        },
                        ErrorPolicy::Continue => {
                            warn!("Error downloading image {}: {}", index, e);
                            summary.failed.push(index);
                        },
                    }
                },
                None => {},
            }

            if stage.writes_metadata() {
                let record = generator.generate(index, &mut rng)?;
                if let Err(e) = writer.write(&record) {
                    Self::discard_in_flight(&mut fetches, halted).await;
                    self.reporter
                        .report_error(PipelineStage::Metadata, index, &e.to_string());
                    return Err(e);
                }
                summary.metadata_written += 1;
                self.reporter.report_progress(ProgressUpdate::new(
                    PipelineStage::Metadata,
                    index,
                    completed,
                    total,
                    start_time,
                ));
            }
        }

        summary.elapsed_ms = start_time.elapsed().as_millis() as u64;
        self.reporter.report_completion(&summary);

        if summary.failed.is_empty() {
            info!(
                downloaded = summary.images_downloaded,
                skipped = summary.images_skipped,
                metadata = summary.metadata_written,
                "Collection run complete"
            );
            Ok(summary)
        } else {
            warn!(
                "Finished with {} errors. Rerun to download the missing files.",
                summary.failed.len()
            );
            Err(CollectionError::Batch {
                failed: summary.failed,
                total,
            })
        }
    }

    /// Stop issuing fetches, wait for the ones in flight and delete what they wrote
    async fn discard_in_flight<S>(fetches: &mut S, halted: &AtomicBool)
    where
        S: Stream<Item = (usize, Option<Result<DownloadedImage>>)> + Unpin,
    {
        halted.store(true, Ordering::Release);

        while let Some((index, fetched)) = fetches.next().await {
            match fetched {
                Some(Ok(image)) if !image.reused => {
                    debug!(index, "Removing image fetched after the run halted");
                    if let Err(e) = std::fs::remove_file(&image.path) {
                        warn!("Failed to remove {}: {}", image.path.display(), e);
                    }
                },
                Some(Err(e)) => debug!(index, "Discarded in-flight failure: {}", e),
                _ => {},
            }
        }
    }

    fn record_image(summary: &mut RunSummary, image: &DownloadedImage) {
        if image.reused {
            summary.images_skipped += 1;
        } else {
            summary.images_downloaded += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;

    struct StaticSource;

    #[async_trait]
    impl ImageSource for StaticSource {
        async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
            tokio::fs::write(destination, url).await?;
            Ok(url.len() as u64)
        }
    }

    fn config(dir: &Path) -> CollectionConfig {
        CollectionConfig::builder()
            .num_files(3)
            .tiers(1, 2)
            .output_folder(dir.join("meta"))
            .download_dir(dir.join("images"))
            .image_base_url("http://images.test/")
            .request_delay_ms(0)
            .seed(11)
            .build()
            .unwrap()
    }

    #[test]
    fn test_stage_flags() {
        assert!(Stage::All.downloads() && Stage::All.writes_metadata());
        assert!(Stage::Download.downloads() && !Stage::Download.writes_metadata());
        assert!(!Stage::Metadata.downloads() && Stage::Metadata.writes_metadata());
        assert_eq!(Stage::default(), Stage::All);
    }

    #[tokio::test]
    async fn test_run_all_produces_both_outputs() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());

        let summary = CollectionPipeline::new(&config, &StaticSource)
            .run(Stage::All)
            .await
            .unwrap();

        assert_eq!(summary.seed, 11);
        assert_eq!(summary.images_downloaded, 3);
        assert_eq!(summary.metadata_written, 3);
        assert!(summary.failed.is_empty());
        for index in 0..3 {
            assert!(config.download_dir.join(format!("{index}.jpg")).is_file());
            assert!(config.output_folder.join(format!("{index}.json")).is_file());
        }
    }

    #[tokio::test]
    async fn test_run_download_only() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());

        let summary = CollectionPipeline::new(&config, &StaticSource)
            .run(Stage::Download)
            .await
            .unwrap();

        assert_eq!(summary.images_downloaded, 3);
        assert_eq!(summary.metadata_written, 0);
        assert!(!config.output_folder.exists());
    }

    #[tokio::test]
    async fn test_run_metadata_only_never_fetches() {
        struct PanicSource;

        #[async_trait]
        impl ImageSource for PanicSource {
            async fn download(&self, _url: &str, _destination: &Path) -> Result<u64> {
                panic!("metadata stage must not fetch");
            }
        }

        let temp = TempDir::new().unwrap();
        let config = config(temp.path());

        let summary = CollectionPipeline::new(&config, &PanicSource)
            .run(Stage::Metadata)
            .await
            .unwrap();

        assert_eq!(summary.metadata_written, 3);
        assert_eq!(summary.images_downloaded, 0);
        assert!(!config.download_dir.exists());
    }

    #[tokio::test]
    async fn test_drawn_seed_can_be_saved_in_config_file() {
        let temp = TempDir::new().unwrap();
        let mut config = config(temp.path());
        config.seed = None;

        for _ in 0..32 {
            let summary = CollectionPipeline::new(&config, &StaticSource)
                .run(Stage::Metadata)
                .await
                .unwrap();
            assert!(summary.seed <= MAX_SEED);

            let mut replay = config.clone();
            replay.seed = Some(summary.seed);
            let rendered = toml::to_string_pretty(&replay).unwrap();
            let parsed = CollectionConfig::from_toml_str(&rendered).unwrap();
            assert_eq!(parsed.seed, Some(summary.seed));
        }
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config() {
        let temp = TempDir::new().unwrap();
        let mut config = config(temp.path());
        config.num_edition = 5;

        let err = CollectionPipeline::new(&config, &StaticSource)
            .run(Stage::All)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::InvalidConfig(_)));
        assert!(!config.output_folder.exists());
    }
}
