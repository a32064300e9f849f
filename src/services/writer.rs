//! Metadata file output
//!
//! Writes each [`MetadataRecord`] as a pretty-printed JSON document named by
//! its index, optionally grouped into one folder per tier.

use crate::{
    config::CollectionConfig,
    error::{CollectionError, Result},
    metadata::MetadataRecord,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Service writing metadata records under the output folder
pub struct MetadataWriter<'a> {
    config: &'a CollectionConfig,
}

impl<'a> MetadataWriter<'a> {
    #[must_use]
    pub fn new(config: &'a CollectionConfig) -> Self {
        Self { config }
    }

    /// Destination of `record`
    ///
    /// `<output_folder>[/<tier>]/<index>[.<extension>]`
    #[must_use]
    pub fn path_for(&self, record: &MetadataRecord) -> PathBuf {
        let dir = if self.config.separate_token_types {
            self.config.output_folder.join(record.token_type.as_str())
        } else {
            self.config.output_folder.clone()
        };

        let file_name = if self.config.metadata_extension.is_empty() {
            record.index.to_string()
        } else {
            format!("{}.{}", record.index, self.config.metadata_extension)
        };
        dir.join(file_name)
    }

    /// Serialize a record to its canonical JSON text
    pub fn to_json(record: &MetadataRecord) -> Result<String> {
        Ok(serde_json::to_string_pretty(record)?)
    }

    /// Write `record`, creating folders as needed; existing files are overwritten
    pub fn write(&self, record: &MetadataRecord) -> Result<PathBuf> {
        let path = self.path_for(record);
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }

        let json = Self::to_json(record)?;
        std::fs::write(&path, json)
            .map_err(|e| CollectionError::file_io_error("write metadata file", &path, &e))?;

        debug!(index = record.index, path = %path.display(), "Wrote metadata");
        Ok(path)
    }

    /// Read a metadata file back, restoring the index
    pub fn read(path: &Path, index: usize) -> Result<MetadataRecord> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CollectionError::file_io_error("read metadata file", path, &e))?;
        let mut record: MetadataRecord = serde_json::from_str(&content)?;
        record.index = index;
        Ok(record)
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CollectionError::file_io_error("create output directory", dir, &e))
}
