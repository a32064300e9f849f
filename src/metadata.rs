//! Metadata record generation
//!
//! Builds one [`MetadataRecord`] per collection index: name and description
//! from the configured templates, the `image` URI under the IPFS folder, the
//! tier from the [`TierPlan`], and a random selection of attributes.

use crate::config::{CollectionConfig, TraitCandidates, TraitSpec, INDEX_PLACEHOLDER};
use crate::error::{CollectionError, Result};
use crate::tier::{Tier, TierPlan};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Value of an attribute: text for list traits, integer for range traits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A single `{trait_type, value}` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: AttributeValue,
}

/// Metadata document for one collection item
///
/// Field order is the serialization order of the JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Position in the collection; encoded in the file name, not the document
    #[serde(skip)]
    pub index: usize,
    pub name: String,
    pub description: String,
    pub image: String,
    pub token_type: Tier,
    pub attributes: Vec<Attribute>,
}

impl TraitCandidates {
    /// Whether `value` belongs to this candidate domain
    #[must_use]
    pub fn contains(&self, value: &AttributeValue) -> bool {
        match (self, value) {
            (Self::Values(values), AttributeValue::Text(text)) => values.contains(text),
            (Self::Range { min, max }, AttributeValue::Number(n)) => (*min..=*max).contains(n),
            _ => false,
        }
    }
}

/// Produces metadata records for a validated configuration
#[derive(Debug)]
pub struct MetadataGenerator<'a> {
    config: &'a CollectionConfig,
    plan: TierPlan,
}

impl<'a> MetadataGenerator<'a> {
    #[must_use]
    pub fn new(config: &'a CollectionConfig) -> Self {
        Self {
            config,
            plan: TierPlan::from_config(config),
        }
    }

    /// Tier layout used by this generator
    #[must_use]
    pub fn plan(&self) -> &TierPlan {
        &self.plan
    }

    /// Generate the record for `index`, drawing attributes from `rng`
    ///
    /// # Errors
    /// - `index` is outside `0..num_files`
    /// - a trait has no candidate values
    pub fn generate<R: Rng>(&self, index: usize, rng: &mut R) -> Result<MetadataRecord> {
        let token_type = self.plan.tier_of(index).ok_or_else(|| {
            CollectionError::invalid_config(format!(
                "Index {} is outside the collection (0..{})",
                index,
                self.plan.len()
            ))
        })?;

        let record = MetadataRecord {
            index,
            name: render(&self.config.name_template, index),
            description: render(&self.config.description_template, index),
            image: self.image_uri(index),
            token_type,
            attributes: self.generate_attributes(rng)?,
        };

        trace!(
            index,
            tier = %record.token_type,
            attributes = record.attributes.len(),
            "Generated metadata record"
        );
        Ok(record)
    }

    /// Draw `min_attributes..=max_attributes` distinct traits and a value for each
    ///
    /// The chosen traits keep the order of the configured vocabulary.
    pub fn generate_attributes<R: Rng>(&self, rng: &mut R) -> Result<Vec<Attribute>> {
        let traits = &self.config.traits;
        let max = self.config.max_attributes.min(traits.len());
        let min = self.config.min_attributes.min(max);
        let count = rng.random_range(min..=max);

        let mut picked = rand::seq::index::sample(rng, traits.len(), count).into_vec();
        picked.sort_unstable();

        let mut attributes = Vec::with_capacity(count);
        for spec in picked.into_iter().filter_map(|i| traits.get(i)) {
            attributes.push(Attribute {
                trait_type: spec.name.clone(),
                value: draw_value(spec, rng)?,
            });
        }
        Ok(attributes)
    }

    /// `image` field for `index`: `<ipfs_folder>/<index>.<ext>`
    #[must_use]
    pub fn image_uri(&self, index: usize) -> String {
        format!(
            "{}/{}",
            self.config.ipfs_folder.trim_end_matches('/'),
            self.config.image_file_name(index)
        )
    }
}

fn draw_value<R: Rng>(spec: &TraitSpec, rng: &mut R) -> Result<AttributeValue> {
    match &spec.candidates {
        TraitCandidates::Values(values) => values
            .choose(rng)
            .map(|v| AttributeValue::Text(v.clone()))
            .ok_or_else(|| {
                CollectionError::invalid_config(format!(
                    "Trait '{}' has no candidate values",
                    spec.name
                ))
            }),
        TraitCandidates::Range { min, max } if min <= max => {
            Ok(AttributeValue::Number(rng.random_range(*min..=*max)))
        },
        TraitCandidates::Range { min, max } => Err(CollectionError::invalid_config(format!(
            "Trait '{}' has an empty range {}..={}",
            spec.name, min, max
        ))),
    }
}

/// Substitute `{index}` in a template
#[must_use]
pub fn render(template: &str, index: usize) -> String {
    template.replace(INDEX_PLACEHOLDER, &index.to_string())
}
