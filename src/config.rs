//! Configuration types for collection generation
//!
//! A [`CollectionConfig`] is built once at startup (defaults, then an optional
//! TOML file, then CLI overrides) and passed by reference to every component.

use crate::error::{CollectionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Placeholder substituted with the item index in URL and text templates
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Largest accepted seed; TOML integers are signed 64-bit
pub const MAX_SEED: u64 = i64::MAX as u64;

/// Rule used to split the index range into tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierOrder {
    /// Indices `0..num_one_of_one` are one-of-one, the rest are editions
    #[default]
    OneOfOneFirst,
    /// Editions come first, one-of-ones take the final indices
    OneOfOneLast,
}

/// What to do when an image cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Stop at the first failure
    #[default]
    Halt,
    /// Record the failure, keep going, and fail the run at the end
    Continue,
}

/// Candidate values for a single trait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitCandidates {
    /// Pick one string from the list
    Values(Vec<String>),
    /// Pick an integer from `min..=max`
    Range { min: i64, max: i64 },
}

impl TraitCandidates {
    /// Number of distinct candidate values
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Values(values) => values.len() as u64,
            Self::Range { min, max } if min <= max => max.abs_diff(*min).saturating_add(1),
            Self::Range { .. } => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named trait and its candidate domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitSpec {
    /// Trait name, written as `trait_type`
    pub name: String,
    #[serde(flatten)]
    pub candidates: TraitCandidates,
}

impl TraitSpec {
    /// Trait picking from a fixed list of strings
    pub fn values<S: Into<String>>(name: S, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            candidates: TraitCandidates::Values(values.iter().map(|v| (*v).to_string()).collect()),
        }
    }

    /// Trait picking from an inclusive integer range
    pub fn range<S: Into<String>>(name: S, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            candidates: TraitCandidates::Range { min, max },
        }
    }
}

/// Default trait vocabulary
#[must_use]
pub fn default_traits() -> Vec<TraitSpec> {
    vec![
        TraitSpec::range("Height", 150, 210),
        TraitSpec::values("Hair", &["Black", "Brown", "Blonde", "Red", "Gray"]),
        TraitSpec::range("Age", 18, 100),
        TraitSpec::values("Eye Color", &["Blue", "Green", "Brown", "Hazel", "Gray"]),
        TraitSpec::values(
            "Nationality",
            &["American", "British", "Canadian", "Australian", "French", "German"],
        ),
        TraitSpec::values(
            "Hobby",
            &["Photography", "Painting", "Hiking", "Gaming", "Cooking", "Traveling"],
        ),
    ]
}

/// Configuration for one collection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Total number of items
    pub num_files: usize,
    /// Items tagged one-of-one
    pub num_one_of_one: usize,
    /// Items tagged edition
    pub num_edition: usize,
    /// Folder receiving metadata files
    pub output_folder: PathBuf,
    /// Folder receiving downloaded images
    pub download_dir: PathBuf,
    /// Storage prefix used to build each item's `image` field
    pub ipfs_folder: String,
    /// Base URL; the padded index is appended unless it contains `{index}`
    pub image_base_url: String,
    /// Image file extension, used both in URLs and file names
    pub image_extension: String,
    /// Zero-padding width of the index in image URLs
    pub index_padding: usize,
    /// Item name, `{index}` is substituted
    pub name_template: String,
    /// Item description, `{index}` is substituted
    pub description_template: String,
    pub tier_order: TierOrder,
    /// Write metadata under one sub-folder per tier
    pub separate_token_types: bool,
    /// Metadata file extension; empty writes bare `<index>` token URI files
    pub metadata_extension: String,
    pub min_attributes: usize,
    pub max_attributes: usize,
    pub traits: Vec<TraitSpec>,
    /// Seed for attribute selection; drawn from OS entropy when absent
    pub seed: Option<u64>,
    pub error_policy: ErrorPolicy,
    /// Leave images that already exist on disk untouched
    pub skip_existing: bool,
    /// Pause after each image request
    pub request_delay_ms: u64,
    /// Number of image requests allowed in flight (1 = sequential)
    pub max_concurrent_downloads: usize,
    pub request_timeout_secs: u64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            num_files: 520,
            num_one_of_one: 10,
            num_edition: 510,
            output_folder: PathBuf::from("data/json-metadata"),
            download_dir: PathBuf::from("data/downloaded-images"),
            ipfs_folder: "ipfs://YOUR_IPFS_FOLDER_CID".to_string(),
            image_base_url: "https://vole.wtf/this-mp-does-not-exist/mp/mp".to_string(),
            image_extension: "jpg".to_string(),
            index_padding: 5,
            name_template: "Fake MP {index}".to_string(),
            description_template: "This is the item with id {index} in the fake MP collection"
                .to_string(),
            tier_order: TierOrder::default(),
            separate_token_types: false,
            metadata_extension: "json".to_string(),
            min_attributes: 0,
            max_attributes: 2,
            traits: default_traits(),
            seed: None,
            error_policy: ErrorPolicy::default(),
            skip_existing: false,
            request_delay_ms: 500,
            max_concurrent_downloads: 1,
            request_timeout_secs: 60,
        }
    }
}

impl CollectionConfig {
    /// Create a new configuration builder starting from the defaults
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection_gen::CollectionConfig;
    ///
    /// let config = CollectionConfig::builder()
    ///     .num_files(3)
    ///     .tiers(1, 2)
    ///     .seed(7)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.num_edition, 2);
    /// ```
    #[must_use]
    pub fn builder() -> CollectionConfigBuilder {
        CollectionConfigBuilder::default()
    }

    /// Parse a TOML document; absent keys keep their default value
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CollectionError::file_io_error("read config file", path, &e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            CollectionError::Serialization(msg) => CollectionError::invalid_config(format!(
                "Failed to parse '{}': {}",
                path.display(),
                msg
            )),
            other => other,
        })
    }

    /// Validate all configuration parameters
    ///
    /// # Validation Rules
    ///
    /// - `num_files` is at least 1
    /// - `num_one_of_one + num_edition == num_files`
    /// - `min_attributes <= max_attributes <= traits.len()`
    /// - trait names are non-empty and unique, candidate domains non-empty
    /// - the base URL is http(s) and concurrency is at least 1
    /// - the seed, when set, fits in a TOML integer
    ///
    /// # Errors
    /// Returns `CollectionError::InvalidConfig` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.num_files == 0 {
            return Err(CollectionError::config_value_error(
                "num_files",
                self.num_files,
                "> 0",
            ));
        }

        let quota = self.num_one_of_one.checked_add(self.num_edition);
        if quota != Some(self.num_files) {
            return Err(CollectionError::invalid_config(format!(
                "Tier quotas must cover every item: num_one_of_one ({}) + num_edition ({}) != num_files ({})",
                self.num_one_of_one, self.num_edition, self.num_files
            )));
        }

        if self.min_attributes > self.max_attributes {
            return Err(CollectionError::invalid_config(format!(
                "min_attributes ({}) is greater than max_attributes ({})",
                self.min_attributes, self.max_attributes
            )));
        }

        if self.max_attributes > self.traits.len() {
            return Err(CollectionError::config_value_error(
                "max_attributes",
                self.max_attributes,
                &format!("0-{} (number of configured traits)", self.traits.len()),
            ));
        }

        let mut seen = HashSet::new();
        for spec in &self.traits {
            if spec.name.trim().is_empty() {
                return Err(CollectionError::invalid_config("Trait name cannot be empty"));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(CollectionError::invalid_config(format!(
                    "Duplicate trait name: {}",
                    spec.name
                )));
            }
            if spec.candidates.is_empty() {
                return Err(CollectionError::invalid_config(format!(
                    "Trait '{}' has no candidate values",
                    spec.name
                )));
            }
        }

        if self.image_base_url.is_empty() {
            return Err(CollectionError::invalid_config(
                "image_base_url cannot be empty",
            ));
        }
        if !self.image_base_url.starts_with("http://")
            && !self.image_base_url.starts_with("https://")
        {
            return Err(CollectionError::invalid_config(format!(
                "Unsupported URL format: {}. Only http:// and https:// are supported",
                self.image_base_url
            )));
        }

        if self.image_extension.is_empty() {
            return Err(CollectionError::invalid_config(
                "image_extension cannot be empty",
            ));
        }

        if let Some(seed) = self.seed {
            if seed > MAX_SEED {
                return Err(CollectionError::config_value_error(
                    "seed",
                    seed,
                    &format!("0-{MAX_SEED}"),
                ));
            }
        }

        if self.max_concurrent_downloads == 0 {
            return Err(CollectionError::config_value_error(
                "max_concurrent_downloads",
                self.max_concurrent_downloads,
                ">= 1",
            ));
        }

        Ok(())
    }

    /// File name of the downloaded image for `index`
    #[must_use]
    pub fn image_file_name(&self, index: usize) -> String {
        format!("{}.{}", index, self.image_extension)
    }
}

/// Builder for `CollectionConfig`
#[derive(Debug, Default)]
pub struct CollectionConfigBuilder {
    config: CollectionConfig,
}

impl CollectionConfigBuilder {
    /// Start from an existing configuration, e.g. one loaded from a file
    #[must_use]
    pub fn from_config(config: CollectionConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn num_files(mut self, num_files: usize) -> Self {
        self.config.num_files = num_files;
        self
    }

    /// Set both tier quotas
    #[must_use]
    pub fn tiers(mut self, num_one_of_one: usize, num_edition: usize) -> Self {
        self.config.num_one_of_one = num_one_of_one;
        self.config.num_edition = num_edition;
        self
    }

    #[must_use]
    pub fn output_folder<P: Into<PathBuf>>(mut self, folder: P) -> Self {
        self.config.output_folder = folder.into();
        self
    }

    #[must_use]
    pub fn download_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    #[must_use]
    pub fn ipfs_folder<S: Into<String>>(mut self, folder: S) -> Self {
        self.config.ipfs_folder = folder.into();
        self
    }

    #[must_use]
    pub fn image_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.image_base_url = url.into();
        self
    }

    #[must_use]
    pub fn image_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.config.image_extension = extension.into();
        self
    }

    #[must_use]
    pub fn index_padding(mut self, width: usize) -> Self {
        self.config.index_padding = width;
        self
    }

    #[must_use]
    pub fn name_template<S: Into<String>>(mut self, template: S) -> Self {
        self.config.name_template = template.into();
        self
    }

    #[must_use]
    pub fn description_template<S: Into<String>>(mut self, template: S) -> Self {
        self.config.description_template = template.into();
        self
    }

    #[must_use]
    pub fn tier_order(mut self, order: TierOrder) -> Self {
        self.config.tier_order = order;
        self
    }

    #[must_use]
    pub fn separate_token_types(mut self, separate: bool) -> Self {
        self.config.separate_token_types = separate;
        self
    }

    #[must_use]
    pub fn metadata_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.config.metadata_extension = extension.into();
        self
    }

    /// Set the inclusive bounds on the number of attributes per item
    #[must_use]
    pub fn attribute_count(mut self, min: usize, max: usize) -> Self {
        self.config.min_attributes = min;
        self.config.max_attributes = max;
        self
    }

    #[must_use]
    pub fn traits(mut self, traits: Vec<TraitSpec>) -> Self {
        self.config.traits = traits;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.error_policy = policy;
        self
    }

    #[must_use]
    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.config.skip_existing = skip;
        self
    }

    #[must_use]
    pub fn request_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.request_delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn max_concurrent_downloads(mut self, max: usize) -> Self {
        self.config.max_concurrent_downloads = max;
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<CollectionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CollectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_one_of_one + config.num_edition, config.num_files);
        assert_eq!(config.traits.len(), 6);
    }

    #[test]
    fn test_builder_rejects_zero_files() {
        let result = CollectionConfig::builder().num_files(0).tiers(0, 0).build();
        assert!(result.unwrap_err().to_string().contains("num_files"));
    }

    #[test]
    fn test_builder_rejects_quota_mismatch() {
        let err = CollectionConfig::builder()
            .num_files(3)
            .tiers(1, 1)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Tier quotas"));

        let err = CollectionConfig::builder()
            .num_files(3)
            .tiers(usize::MAX, 4)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Tier quotas"));
    }

    #[test]
    fn test_attribute_bounds_validation() {
        let err = CollectionConfig::builder()
            .num_files(1)
            .tiers(1, 0)
            .attribute_count(3, 1)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("min_attributes"));

        let err = CollectionConfig::builder()
            .num_files(1)
            .tiers(1, 0)
            .traits(vec![TraitSpec::values("Hair", &["Black"])])
            .attribute_count(0, 2)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_attributes"));
    }

    #[test]
    fn test_trait_validation() {
        let base = || CollectionConfig::builder().num_files(1).tiers(0, 1).attribute_count(0, 1);

        let duplicate = base()
            .traits(vec![
                TraitSpec::values("Hair", &["Black"]),
                TraitSpec::values("Hair", &["Red"]),
            ])
            .build();
        assert!(duplicate.unwrap_err().to_string().contains("Duplicate trait"));

        let empty_list = base().traits(vec![TraitSpec::values("Hair", &[])]).build();
        assert!(empty_list.unwrap_err().to_string().contains("no candidate"));

        let bad_range = base().traits(vec![TraitSpec::range("Age", 10, 1)]).build();
        assert!(bad_range.unwrap_err().to_string().contains("no candidate"));

        let unnamed = base().traits(vec![TraitSpec::values("  ", &["x"])]).build();
        assert!(unnamed.unwrap_err().to_string().contains("name cannot be empty"));
    }

    #[test]
    fn test_url_and_concurrency_validation() {
        let base = || CollectionConfig::builder().num_files(1).tiers(1, 0);

        assert!(base().image_base_url("").build().is_err());
        assert!(base().image_base_url("ftp://host/img").build().is_err());
        assert!(base().image_base_url("http://localhost:8080/").build().is_ok());
        assert!(base().max_concurrent_downloads(0).build().is_err());
        assert!(base().image_extension("").build().is_err());
    }

    #[test]
    fn test_seed_must_fit_toml_integer() {
        let base = || CollectionConfig::builder().num_files(1).tiers(1, 0);

        let err = base().seed(u64::MAX).build().unwrap_err();
        assert!(err.to_string().contains("seed"));

        let config = base().seed(MAX_SEED).build().unwrap();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed = CollectionConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(parsed.seed, Some(MAX_SEED));
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_trait_candidate_len() {
        assert_eq!(TraitCandidates::Range { min: 150, max: 210 }.len(), 61);
        assert_eq!(TraitCandidates::Range { min: -2, max: 2 }.len(), 5);
        assert!(TraitCandidates::Range { min: 3, max: 2 }.is_empty());
        assert_eq!(TraitSpec::values("Hair", &["a", "b"]).candidates.len(), 2);
    }

    #[test]
    fn test_from_toml_str_partial_override() {
        let config = CollectionConfig::from_toml_str(
            r#"
            num_files = 3
            num_one_of_one = 1
            num_edition = 2
            output_folder = "out/meta"
            tier_order = "one-of-one-last"
            error_policy = "continue"
            seed = 42
            max_attributes = 1

            [[traits]]
            name = "Hair"
            values = ["Black", "Red"]

            [[traits]]
            name = "Age"
            range = { min = 18, max = 30 }
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.num_files, 3);
        assert_eq!(config.output_folder, PathBuf::from("out/meta"));
        assert_eq!(config.tier_order, TierOrder::OneOfOneLast);
        assert_eq!(config.error_policy, ErrorPolicy::Continue);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.traits.len(), 2);
        assert_eq!(
            config.traits[1].candidates,
            TraitCandidates::Range { min: 18, max: 30 }
        );
        // untouched keys keep defaults
        assert_eq!(config.index_padding, 5);
        assert_eq!(config.metadata_extension, "json");
    }

    #[test]
    fn test_from_toml_str_rejects_invalid() {
        assert!(matches!(
            CollectionConfig::from_toml_str("num_files = \"many\""),
            Err(CollectionError::Serialization(_))
        ));
        assert!(matches!(
            CollectionConfig::from_toml_str("num_files = 4"),
            Err(CollectionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_toml_file_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = CollectionConfig::from_toml_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("read config file"));
    }

    #[test]
    fn test_image_file_name() {
        let config = CollectionConfig::builder()
            .num_files(1)
            .tiers(1, 0)
            .image_extension("png")
            .build()
            .unwrap();
        assert_eq!(config.image_file_name(12), "12.png");
    }
}
