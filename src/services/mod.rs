//! Service layer
//!
//! Infrastructure concerns kept apart from the pipeline logic: writing
//! metadata files and reporting progress.

pub mod progress;
pub mod writer;

#[cfg(feature = "cli")]
pub use progress::IndicatifProgressReporter;
pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use writer::MetadataWriter;
