/// Location pricing — fills in missing day-rates from the sourcing channel
/// and the venue type.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::location::{CostBreakdown, LocationSuggestion, SourcingChannel};

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid rate for {context}: {value}")]
    InvalidRate { context: String, value: f64 },
}

/// Daily base rate for one sourcing channel, in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRate {
    pub channel: SourcingChannel,
    pub day_rate: f64,
}

/// What a matching venue type does to the base rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VenueEffect {
    Multiply(f64),
    /// Price forced to zero whatever the channel.
    Free,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueAdjustment {
    /// Lowercase substrings looked for in the venue type.
    pub keywords: Vec<String>,
    pub effect: VenueEffect,
}

impl VenueAdjustment {
    fn new(keywords: &[&str], effect: VenueEffect) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            effect,
        }
    }

    fn matches(&self, venue_type_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| venue_type_lower.contains(k.as_str()))
    }
}

/// Base rates by channel and ordered venue-type adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    pub base_rates: Vec<ChannelRate>,
    /// Used for channels missing from `base_rates`.
    pub fallback_rate: f64,
    /// Checked in order; the first match applies.
    pub adjustments: Vec<VenueAdjustment>,
}

impl Default for PricingTable {
    fn default() -> Self {
        let rate = |channel, day_rate| ChannelRate { channel, day_rate };
        Self {
            base_rates: vec![
                rate(SourcingChannel::Airbnb, 200.0),
                rate(SourcingChannel::Peerspace, 275.0),
                rate(SourcingChannel::Giggster, 350.0),
                rate(SourcingChannel::PublicSpace, 0.0),
                rate(SourcingChannel::SpecificVenue, 550.0),
                rate(SourcingChannel::Rental, 425.0),
                rate(SourcingChannel::Other, 275.0),
            ],
            fallback_rate: 275.0,
            adjustments: vec![
                VenueAdjustment::new(
                    &["residential", "loft", "apartment"],
                    VenueEffect::Multiply(0.8),
                ),
                VenueAdjustment::new(&["commercial", "office"], VenueEffect::Multiply(1.1)),
                VenueAdjustment::new(&["industrial", "warehouse"], VenueEffect::Multiply(1.3)),
                VenueAdjustment::new(&["public", "park", "library", "street"], VenueEffect::Free),
            ],
        }
    }
}

impl PricingTable {
    /// Load a pricing table from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Self, PricingError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a pricing table from a RON string.
    pub fn parse_ron(input: &str) -> Result<Self, PricingError> {
        let table: PricingTable = ron::from_str(input)?;
        table.check_rates()?;
        Ok(table)
    }

    fn check_rates(&self) -> Result<(), PricingError> {
        let invalid = |v: f64| !v.is_finite() || v < 0.0;
        for rate in &self.base_rates {
            if invalid(rate.day_rate) {
                return Err(PricingError::InvalidRate {
                    context: format!("channel {}", rate.channel),
                    value: rate.day_rate,
                });
            }
        }
        if invalid(self.fallback_rate) {
            return Err(PricingError::InvalidRate {
                context: "fallback".to_string(),
                value: self.fallback_rate,
            });
        }
        for adjustment in &self.adjustments {
            if let VenueEffect::Multiply(m) = adjustment.effect {
                if invalid(m) {
                    return Err(PricingError::InvalidRate {
                        context: format!("venue keywords {:?}", adjustment.keywords),
                        value: m,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn base_rate(&self, channel: SourcingChannel) -> f64 {
        self.base_rates
            .iter()
            .find(|r| r.channel == channel)
            .map_or(self.fallback_rate, |r| r.day_rate)
    }

    /// First adjustment whose keyword appears in `venue_type`, ignoring case.
    pub fn adjustment_for(&self, venue_type: &str) -> Option<&VenueAdjustment> {
        let lower = venue_type.to_lowercase();
        self.adjustments.iter().find(|a| a.matches(&lower))
    }
}

/// An estimated day-rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub day_rate: f64,
    pub is_estimated: bool,
}

/// Applies a [`PricingTable`] to location suggestions.
#[derive(Debug, Clone, Default)]
pub struct PricingEstimator {
    pub table: PricingTable,
}

impl PricingEstimator {
    pub fn new(table: PricingTable) -> Self {
        Self { table }
    }

    /// Estimate a day-rate, rounded to whole dollars.
    ///
    /// Does not check whether the suggestion needed one; see
    /// [`PricingEstimator::needs_estimation`].
    pub fn estimate(&self, suggestion: &LocationSuggestion) -> PriceEstimate {
        let base = self.table.base_rate(suggestion.sourcing);
        let day_rate = match self.table.adjustment_for(&suggestion.venue_type) {
            Some(VenueAdjustment {
                effect: VenueEffect::Free,
                ..
            }) => 0.0,
            Some(VenueAdjustment {
                effect: VenueEffect::Multiply(m),
                ..
            }) => (base * m).round(),
            None => base.round(),
        };
        PriceEstimate {
            day_rate,
            is_estimated: true,
        }
    }

    /// A free public entry: a public-space listing, or a venue type the
    /// table prices at zero.
    fn is_free_public(&self, suggestion: &LocationSuggestion) -> bool {
        suggestion.sourcing == SourcingChannel::PublicSpace
            || matches!(
                self.table.adjustment_for(&suggestion.venue_type),
                Some(VenueAdjustment {
                    effect: VenueEffect::Free,
                    ..
                })
            )
    }

    /// True when the day-rate is zero or absent on a paid listing, or when
    /// the suggestion carries no cost fields at all. A rate this estimator
    /// already wrote is settled, even when the table priced it at zero.
    pub fn needs_estimation(&self, suggestion: &LocationSuggestion) -> bool {
        if suggestion.is_estimated && suggestion.existing_day_rate().is_some() {
            return false;
        }
        let rate_missing = suggestion.existing_day_rate().map_or(true, |r| r == 0.0);
        (rate_missing && !self.is_free_public(suggestion)) || suggestion.has_no_cost_fields()
    }

    /// Return the suggestion as-is if it has a usable price, otherwise with an
    /// estimated one written to both cost fields.
    pub fn apply_if_needed(&self, suggestion: LocationSuggestion) -> LocationSuggestion {
        if !self.needs_estimation(&suggestion) {
            return suggestion;
        }

        let estimate = self.estimate(&suggestion);
        tracing::debug!(
            "Estimated day rate {} for '{}' ({}, {})",
            estimate.day_rate,
            suggestion.name,
            suggestion.sourcing,
            suggestion.venue_type
        );

        let cost_breakdown = match suggestion.cost_breakdown {
            Some(existing) => CostBreakdown {
                day_rate: estimate.day_rate,
                ..existing
            },
            None => CostBreakdown {
                day_rate: estimate.day_rate,
                ..CostBreakdown::default()
            },
        };

        LocationSuggestion {
            cost_breakdown: Some(cost_breakdown),
            estimated_cost: Some(estimate.day_rate),
            is_estimated: estimate.is_estimated,
            ..suggestion
        }
    }

    /// [`PricingEstimator::apply_if_needed`] over a batch, order preserved.
    pub fn apply_all(&self, suggestions: Vec<LocationSuggestion>) -> Vec<LocationSuggestion> {
        suggestions
            .into_iter()
            .map(|s| self.apply_if_needed(s))
            .collect()
    }
}
