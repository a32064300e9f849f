//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use collection_gen::{CollectionConfig, CollectionError, ImageSource, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

/// In-memory image source that fails for selected indices
///
/// The index is recovered from the URL (`http://images.test/mpNNNNN.jpg`).
#[derive(Default)]
pub struct FakeImageSource {
    failing: HashSet<usize>,
    requests: Mutex<Vec<String>>,
}

impl FakeImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(indices: &[usize]) -> Self {
        Self {
            failing: indices.iter().copied().collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Deterministic fake image body for `index`
    pub fn body(index: usize) -> Vec<u8> {
        format!("fake-jpeg-{index}").into_bytes()
    }
}

fn index_from_url(url: &str) -> usize {
    let digits: String = url
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().expect("URL carries an index")
}

#[async_trait]
impl ImageSource for FakeImageSource {
    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        self.requests.lock().unwrap().push(url.to_string());
        let index = index_from_url(url);

        if self.failing.contains(&index) {
            return Err(CollectionError::network_error(
                format!("HTTP error 500 Internal Server Error for {url}"),
                std::io::Error::new(std::io::ErrorKind::Other, "HTTP error"),
            ));
        }

        let body = Self::body(index);
        tokio::fs::write(destination, &body).await?;
        Ok(body.len() as u64)
    }
}

/// Small, fast configuration rooted in `dir`
pub fn test_config(dir: &Path, num_one_of_one: usize, num_edition: usize) -> CollectionConfig {
    CollectionConfig::builder()
        .num_files(num_one_of_one + num_edition)
        .tiers(num_one_of_one, num_edition)
        .output_folder(dir.join("json-metadata"))
        .download_dir(dir.join("downloaded-images"))
        .image_base_url("http://images.test/mp")
        .ipfs_folder("ipfs://bafytestfolder")
        .request_delay_ms(0)
        .seed(2024)
        .build()
        .expect("test configuration is valid")
}

/// Sorted names of the regular files in `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
