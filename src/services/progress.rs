//! Progress reporting service
//!
//! This module separates progress reporting concerns from the pipeline,
//! allowing the CLI to draw a progress bar while library users stay silent.

use crate::pipeline::RunSummary;
use std::time::Instant;
use tracing::{error, info};

/// Steps performed for each collection item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Fetching the image
    Download,
    /// Generating and writing the metadata file
    Metadata,
}

impl PipelineStage {
    /// Get a human-readable description of the stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            PipelineStage::Download => "Downloading image",
            PipelineStage::Metadata => "Writing metadata",
        }
    }
}

/// Progress update emitted after each finished item
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Stage that just finished for this item
    pub stage: PipelineStage,
    /// Collection index of the item
    pub index: usize,
    /// Items finished so far, including this one
    pub completed: usize,
    /// Total number of items in the run
    pub total: usize,
    /// Elapsed time since the run started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(
        stage: PipelineStage,
        index: usize,
        completed: usize,
        total: usize,
        start_time: Instant,
    ) -> Self {
        Self {
            stage,
            index,
            completed,
            total,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        }
    }

    /// Progress percentage (0-100)
    #[must_use]
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed.min(self.total) * 100) / self.total) as u8
    }
}

/// Trait for reporting progress during a collection run
pub trait ProgressReporter: Send + Sync {
    /// Report that an item finished
    fn report_progress(&self, update: ProgressUpdate);

    /// Report a failed item
    fn report_error(&self, stage: PipelineStage, index: usize, error: &str);

    /// Report the end of the run
    fn report_completion(&self, summary: &RunSummary);
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_error(&self, _stage: PipelineStage, _index: usize, _error: &str) {}

    fn report_completion(&self, _summary: &RunSummary) {}
}

/// Progress reporter that emits tracing events
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// # Arguments
    /// * `verbose` - Whether to log every item instead of only the summary
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            info!(
                "[{}%] {} {} ({}/{}, {}ms elapsed)",
                update.percentage(),
                update.stage.description(),
                update.index,
                update.completed,
                update.total,
                update.elapsed_ms
            );
        }
    }

    fn report_error(&self, stage: PipelineStage, index: usize, error: &str) {
        error!("❌ {} {} failed: {}", stage.description(), index, error);
    }

    fn report_completion(&self, summary: &RunSummary) {
        info!(
            "✅ Finished in {}ms: {} downloaded, {} skipped, {} metadata file(s), {} error(s)",
            summary.elapsed_ms,
            summary.images_downloaded,
            summary.images_skipped,
            summary.metadata_written,
            summary.failed.len()
        );
    }
}

/// Progress bar reporter for interactive terminals
#[cfg(feature = "cli")]
pub struct IndicatifProgressReporter {
    bar: indicatif::ProgressBar,
}

#[cfg(feature = "cli")]
impl IndicatifProgressReporter {
    #[must_use]
    pub fn new(total: usize) -> Self {
        use indicatif::{ProgressBar, ProgressStyle};

        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }
}

#[cfg(feature = "cli")]
impl ProgressReporter for IndicatifProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        self.bar.set_position(update.completed as u64);
        self.bar
            .set_message(format!("{} {}", update.stage.description(), update.index));
    }

    fn report_error(&self, stage: PipelineStage, index: usize, error: &str) {
        self.bar
            .println(format!("❌ {} {} failed: {}", stage.description(), index, error));
    }

    fn report_completion(&self, summary: &RunSummary) {
        let message = if summary.failed.is_empty() {
            format!("✅ {} item(s) done", summary.metadata_written.max(summary.images_downloaded))
        } else {
            format!("❌ {} failure(s)", summary.failed.len())
        };
        self.bar.finish_with_message(message);
    }
}
