//! Tier assignment
//!
//! Splits `0..num_files` into the one-of-one and edition tiers. The split is a
//! pure function of the quotas and the [`TierOrder`], so reruns with the same
//! configuration always tag the same indices.

use crate::config::{CollectionConfig, TierOrder};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Tier of a collection item, written as `token_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    OneOfOne,
    Edition,
}

impl Tier {
    /// Kebab-case label, also used as the per-tier folder name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneOfOne => "one-of-one",
            Self::Edition => "edition",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partition of the index range into tiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPlan {
    one_of_one: Range<usize>,
    edition: Range<usize>,
}

impl TierPlan {
    /// Lay out `num_one_of_one + num_edition` indices according to `order`
    ///
    /// Quotas whose sum overflows are clamped at `usize::MAX`.
    #[must_use]
    pub fn new(num_one_of_one: usize, num_edition: usize, order: TierOrder) -> Self {
        match order {
            TierOrder::OneOfOneFirst => Self {
                one_of_one: 0..num_one_of_one,
                edition: num_one_of_one..num_one_of_one.saturating_add(num_edition),
            },
            TierOrder::OneOfOneLast => Self {
                edition: 0..num_edition,
                one_of_one: num_edition..num_edition.saturating_add(num_one_of_one),
            },
        }
    }

    /// Plan for a validated configuration
    #[must_use]
    pub fn from_config(config: &CollectionConfig) -> Self {
        Self::new(config.num_one_of_one, config.num_edition, config.tier_order)
    }

    /// Number of items covered by the plan
    #[must_use]
    pub fn len(&self) -> usize {
        self.one_of_one.len().saturating_add(self.edition.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tier of `index`, `None` when it lies outside the collection
    #[must_use]
    pub fn tier_of(&self, index: usize) -> Option<Tier> {
        if self.one_of_one.contains(&index) {
            Some(Tier::OneOfOne)
        } else if self.edition.contains(&index) {
            Some(Tier::Edition)
        } else {
            None
        }
    }

    /// Indices assigned to `tier`, ascending
    #[must_use]
    pub fn indices(&self, tier: Tier) -> Range<usize> {
        match tier {
            Tier::OneOfOne => self.one_of_one.clone(),
            Tier::Edition => self.edition.clone(),
        }
    }
}
