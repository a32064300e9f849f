//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliStage};
use crate::{
    config::{CollectionConfig, CollectionConfigBuilder, ErrorPolicy},
    pipeline::Stage,
};
use anyhow::{Context, Result};

/// Convert CLI arguments to a validated `CollectionConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Built-in defaults, then the config file, then flag overrides
    pub(crate) fn from_cli(cli: &Cli) -> Result<CollectionConfig> {
        let base = match &cli.config {
            Some(path) => CollectionConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => CollectionConfig::default(),
        };

        let mut builder = CollectionConfigBuilder::from_config(base);
        if let Some(seed) = cli.seed {
            builder = builder.seed(seed);
        }
        if cli.continue_on_error {
            builder = builder.error_policy(ErrorPolicy::Continue);
        }
        if cli.skip_existing {
            builder = builder.skip_existing(true);
        }

        builder.build().context("Invalid configuration")
    }

    /// Pipeline stage selected on the command line
    pub(crate) fn stage(cli: &Cli) -> Stage {
        match cli.stage {
            CliStage::All => Stage::All,
            CliStage::Download => Stage::Download,
            CliStage::Metadata => Stage::Metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_no_arguments_uses_defaults() {
        let cli = Cli::parse_from(["collection-gen"]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(config, CollectionConfig::default());
        assert_eq!(CliConfigBuilder::stage(&cli), Stage::All);
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "num_files = 3\nnum_one_of_one = 1\nnum_edition = 2\nseed = 1\nskip_existing = false"
        )
        .unwrap();

        let cli = Cli::parse_from([
            "collection-gen",
            "--config",
            file.path().to_str().unwrap(),
            "--seed",
            "99",
            "--continue-on-error",
            "--skip-existing",
            "--stage",
            "metadata",
        ]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();

        assert_eq!(config.num_files, 3);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.error_policy, ErrorPolicy::Continue);
        assert!(config.skip_existing);
        assert_eq!(CliConfigBuilder::stage(&cli), Stage::Metadata);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "num_files = 3").unwrap();

        let cli = Cli::parse_from(["collection-gen", "-c", file.path().to_str().unwrap()]);
        let err = CliConfigBuilder::from_cli(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("Tier quotas"));
    }
}
