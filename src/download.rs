//! Image downloading for indexed URL sequences
//!
//! [`ImageFetcher`] turns a collection index into a URL and a local path and
//! hands the transfer to an [`ImageSource`]. The default source,
//! [`HttpImageSource`], streams the response body into a temporary `.part`
//! file and renames it into place once the transfer is complete.

use crate::config::{CollectionConfig, INDEX_PLACEHOLDER};
use crate::error::{CollectionError, Result};
use async_trait::async_trait;
use futures_util::stream::TryStreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

/// A local image produced by the fetch step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedImage {
    /// Collection index
    pub index: usize,
    /// Location of the saved image
    pub path: PathBuf,
    /// Bytes written; 0 when an existing file was reused
    pub bytes: u64,
    /// The file was already present and `skip_existing` is on
    pub reused: bool,
}

/// Transport that saves the resource at `url` to `destination`
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Download `url` to `destination`, returning the number of bytes written
    ///
    /// # Errors
    /// - transport failure or non-success status (`CollectionError::Network`)
    /// - file system errors while writing `destination`
    async fn download(&self, url: &str, destination: &Path) -> Result<u64>;
}

/// reqwest-backed image source
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    /// Create an HTTP source with a per-request timeout
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollectionError::network_error("Failed to create HTTP client", e))?;

        Ok(Self { client })
    }

    /// Source configured from `request_timeout_secs`
    pub fn from_config(config: &CollectionConfig) -> Result<Self> {
        Self::new(Duration::from_secs(config.request_timeout_secs))
    }

    async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| CollectionError::file_io_error("create file", path, &e))?;

        let mut stream = StreamReader::new(
            response
                .bytes_stream()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
        );

        let downloaded = tokio::io::copy(&mut stream, &mut file)
            .await
            .map_err(|e| copy_error(e, path))?;

        file.flush()
            .await
            .map_err(|e| CollectionError::file_io_error("flush file", path, &e))?;

        Ok(downloaded)
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        debug!("Downloading: {} -> {}", url, destination.display());

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CollectionError::file_io_error("create directory", parent, &e))?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CollectionError::network_error(format!("Failed to download {}", url), e))?;

        if !response.status().is_success() {
            return Err(CollectionError::network_error(
                format!("HTTP error {} for {}", response.status(), url),
                std::io::Error::new(std::io::ErrorKind::Other, "HTTP error"),
            ));
        }

        let part_path = part_path(destination);
        match Self::stream_to_file(response, &part_path).await {
            Ok(bytes) => {
                tokio::fs::rename(&part_path, destination).await.map_err(|e| {
                    CollectionError::file_io_error("move downloaded image", destination, &e)
                })?;
                debug!("Downloaded {} bytes to {}", bytes, destination.display());
                Ok(bytes)
            },
            Err(e) => {
                if let Err(cleanup_err) = tokio::fs::remove_file(&part_path).await {
                    if cleanup_err.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove partial download: {}", cleanup_err);
                    }
                }
                Err(e)
            },
        }
    }
}

/// Resolves URLs and paths for each index and delegates to an [`ImageSource`]
pub struct ImageFetcher<'a> {
    config: &'a CollectionConfig,
    source: &'a dyn ImageSource,
}

impl<'a> ImageFetcher<'a> {
    pub fn new(config: &'a CollectionConfig, source: &'a dyn ImageSource) -> Self {
        Self { config, source }
    }

    /// Create the download directory if it does not exist
    pub fn prepare(&self) -> Result<()> {
        let dir = &self.config.download_dir;
        std::fs::create_dir_all(dir)
            .map_err(|e| CollectionError::file_io_error("create download directory", dir, &e))
    }

    /// Local path of the image for `index`
    #[must_use]
    pub fn image_path(&self, index: usize) -> PathBuf {
        self.config
            .download_dir
            .join(self.config.image_file_name(index))
    }

    /// Fetch a single image
    ///
    /// Waits `request_delay_ms` after every request, successful or not.
    pub async fn fetch(&self, index: usize) -> Result<DownloadedImage> {
        let path = self.image_path(index);

        if self.config.skip_existing && path.exists() {
            info!("File {} exists, skipping.", path.display());
            return Ok(DownloadedImage {
                index,
                path,
                bytes: 0,
                reused: true,
            });
        }

        let url = image_url(self.config, index);
        info!("Downloading image {} from {}", index, url);
        let result = self.source.download(&url, &path).await;

        if self.config.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }

        let bytes = result?;
        info!("Successfully downloaded image {}", index);
        Ok(DownloadedImage {
            index,
            path,
            bytes,
            reused: false,
        })
    }
}

/// URL of the image for `index`
///
/// The index is zero-padded to `index_padding` digits. It replaces `{index}`
/// when the base URL contains it; otherwise it is appended together with the
/// image extension.
///
/// ```rust
/// use collection_gen::{download::image_url, CollectionConfig};
///
/// let config = CollectionConfig::default();
/// assert_eq!(
///     image_url(&config, 7),
///     "https://vole.wtf/this-mp-does-not-exist/mp/mp00007.jpg"
/// );
/// ```
#[must_use]
pub fn image_url(config: &CollectionConfig, index: usize) -> String {
    let padded = format!("{:0width$}", index, width = config.index_padding);
    if config.image_base_url.contains(INDEX_PLACEHOLDER) {
        config.image_base_url.replace(INDEX_PLACEHOLDER, &padded)
    } else {
        format!(
            "{}{}.{}",
            config.image_base_url, padded, config.image_extension
        )
    }
}

/// Body read failures carry the `reqwest::Error` they were wrapped from;
/// anything else came from writing the file.
fn copy_error(error: std::io::Error, path: &Path) -> CollectionError {
    let from_body = error
        .get_ref()
        .is_some_and(|inner| inner.is::<reqwest::Error>());
    if from_body {
        CollectionError::network_error("Failed to read download stream", error)
    } else {
        CollectionError::file_io_error("write file", path, &error)
    }
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
