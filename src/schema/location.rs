use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Newtype wrapper for location suggestion IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub Uuid);

impl LocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a location suggestion was sourced from.
///
/// Parsing never fails: any unrecognized channel becomes `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourcingChannel {
    Airbnb,
    Peerspace,
    Giggster,
    PublicSpace,
    SpecificVenue,
    Rental,
    Other,
}

impl SourcingChannel {
    pub const ALL: [SourcingChannel; 7] = [
        Self::Airbnb,
        Self::Peerspace,
        Self::Giggster,
        Self::PublicSpace,
        Self::SpecificVenue,
        Self::Rental,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Airbnb => "airbnb",
            Self::Peerspace => "peerspace",
            Self::Giggster => "giggster",
            Self::PublicSpace => "public-space",
            Self::SpecificVenue => "specific-venue",
            Self::Rental => "rental",
            Self::Other => "other",
        }
    }
}

impl FromStr for SourcingChannel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        Ok(match normalized.as_str() {
            "airbnb" => Self::Airbnb,
            "peerspace" => Self::Peerspace,
            "giggster" => Self::Giggster,
            "public-space" => Self::PublicSpace,
            "specific-venue" => Self::SpecificVenue,
            "rental" => Self::Rental,
            _ => Self::Other,
        })
    }
}

impl From<String> for SourcingChannel {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(channel) => channel,
            Err(never) => match never {},
        }
    }
}

impl From<SourcingChannel> for String {
    fn from(channel: SourcingChannel) -> Self {
        channel.as_str().to_string()
    }
}

impl fmt::Display for SourcingChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Itemized cost for a location. Amounts are in whole-or-fractional USD.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub day_rate: f64,
    #[serde(default)]
    pub permit_fee: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A candidate shoot location produced by a search or generation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    /// Suggestions that arrive without an id get a fresh one.
    #[serde(default)]
    pub id: LocationId,
    pub name: String,
    pub sourcing: SourcingChannel,
    /// Free-text venue description, e.g. "Industrial Warehouse".
    pub venue_type: String,
    #[serde(default)]
    pub cost_breakdown: Option<CostBreakdown>,
    /// Legacy single-number cost, kept in sync with `cost_breakdown.day_rate`
    /// once a price has been estimated.
    #[serde(default)]
    pub estimated_cost: Option<f64>,
    #[serde(default)]
    pub is_estimated: bool,
}

impl LocationSuggestion {
    pub fn new(
        name: impl Into<String>,
        sourcing: SourcingChannel,
        venue_type: impl Into<String>,
    ) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            sourcing,
            venue_type: venue_type.into(),
            cost_breakdown: None,
            estimated_cost: None,
            is_estimated: false,
        }
    }

    pub fn with_day_rate(mut self, day_rate: f64) -> Self {
        self.cost_breakdown = Some(CostBreakdown {
            day_rate,
            ..CostBreakdown::default()
        });
        self
    }

    /// The day-rate currently on record: the breakdown's, else the legacy field.
    pub fn existing_day_rate(&self) -> Option<f64> {
        self.cost_breakdown
            .as_ref()
            .map(|c| c.day_rate)
            .or(self.estimated_cost)
    }

    /// True when neither the breakdown nor the legacy cost field is present.
    pub fn has_no_cost_fields(&self) -> bool {
        self.cost_breakdown.is_none() && self.estimated_cost.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_parsing() {
        assert_eq!("airbnb".parse::<SourcingChannel>().unwrap(), SourcingChannel::Airbnb);
        assert_eq!(
            "Public Space".parse::<SourcingChannel>().unwrap(),
            SourcingChannel::PublicSpace
        );
        assert_eq!(
            "specific_venue".parse::<SourcingChannel>().unwrap(),
            SourcingChannel::SpecificVenue
        );
        assert_eq!(
            "craigslist".parse::<SourcingChannel>().unwrap(),
            SourcingChannel::Other
        );
    }

    #[test]
    fn channel_serde_uses_kebab_strings() {
        let json = serde_json::to_string(&SourcingChannel::PublicSpace).unwrap();
        assert_eq!(json, "\"public-space\"");
        let parsed: SourcingChannel = serde_json::from_str("\"somewhere-new\"").unwrap();
        assert_eq!(parsed, SourcingChannel::Other);
    }

    #[test]
    fn existing_day_rate_prefers_breakdown() {
        let mut loc = LocationSuggestion::new("Loft", SourcingChannel::Peerspace, "Loft")
            .with_day_rate(300.0);
        loc.estimated_cost = Some(250.0);
        assert_eq!(loc.existing_day_rate(), Some(300.0));

        loc.cost_breakdown = None;
        assert_eq!(loc.existing_day_rate(), Some(250.0));

        loc.estimated_cost = None;
        assert_eq!(loc.existing_day_rate(), None);
        assert!(loc.has_no_cost_fields());
    }

    #[test]
    fn suggestion_without_id_gets_one() {
        let json = r#"{"name": "Pier 9", "sourcing": "public_space", "venue_type": "Waterfront"}"#;
        let loc: LocationSuggestion = serde_json::from_str(json).unwrap();
        assert_eq!(loc.sourcing, SourcingChannel::PublicSpace);
        assert!(loc.has_no_cost_fields());
        assert!(!loc.is_estimated);
        assert_ne!(loc.id.0, Uuid::nil());
    }
}
