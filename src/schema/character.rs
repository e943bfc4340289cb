use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::relationship::Relationship;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("{tier:?} character is missing its {section} payload")]
    MissingPayload {
        tier: ComplexityTier,
        section: &'static str,
    },
    #[error("{tier:?} character must not carry a {section} payload")]
    UnexpectedPayload {
        tier: ComplexityTier,
        section: &'static str,
    },
    #[error("detailed {section:?} section is missing required keys: {keys:?}")]
    MissingSectionKeys {
        section: SectionKind,
        keys: Vec<&'static str>,
    },
    #[error("cannot derive a {to:?} character from a {from:?} one")]
    CannotDeriveUpward {
        from: ComplexityTier,
        to: ComplexityTier,
    },
}

/// Newtype wrapper for character IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

/// The dramatic role a character plays in the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NarrativeRole {
    Protagonist,
    Antagonist,
    SecondaryAntagonist,
    LoveInterest,
    Mentor,
    Ally,
    Rival,
    Family,
    Friend,
    AuthorityFigure,
    ComicRelief,
    Wildcard,
    Ensemble,
    Catalyst,
    Mirror,
    Threshold,
}

impl NarrativeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Protagonist => "protagonist",
            Self::Antagonist => "antagonist",
            Self::SecondaryAntagonist => "secondary-antagonist",
            Self::LoveInterest => "love-interest",
            Self::Mentor => "mentor",
            Self::Ally => "ally",
            Self::Rival => "rival",
            Self::Family => "family",
            Self::Friend => "friend",
            Self::AuthorityFigure => "authority-figure",
            Self::ComicRelief => "comic-relief",
            Self::Wildcard => "wildcard",
            Self::Ensemble => "ensemble",
            Self::Catalyst => "catalyst",
            Self::Mirror => "mirror",
            Self::Threshold => "threshold",
        }
    }
}

/// How much of a character has been elaborated.
///
/// Ordered: `Minimal < Balanced < Detailed`. A character only moves up
/// in place; lower-tier copies are new entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Minimal,
    Balanced,
    Detailed,
}

/// Who touched the character last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Authorship {
    User,
    Automated,
}

/// Present at every tier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BasicInfo {
    pub description: String,
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub narrative_function: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimplifiedPhysiology {
    pub age: String,
    pub gender: String,
    pub appearance: String,
    #[serde(default)]
    pub build: Option<String>,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub key_traits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorePsychology {
    pub core_value: String,
    #[serde(default)]
    pub opposing_value: Option<String>,
    pub want: String,
    pub need: String,
    pub primary_flaw: String,
    #[serde(default)]
    pub secondary_flaws: Vec<String>,
    #[serde(default)]
    pub temperament: Vec<String>,
    #[serde(default)]
    pub key_fears: Vec<String>,
    #[serde(default)]
    pub key_strengths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub speech_pattern: String,
    #[serde(default)]
    pub vocabulary_notes: Option<String>,
    #[serde(default)]
    pub quirks: Vec<String>,
}

/// Present at the balanced and detailed tiers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalancedProfile {
    pub physiology: SimplifiedPhysiology,
    pub psychology: CorePsychology,
    pub backstory: String,
    pub voice: VoiceProfile,
}

/// Which extended sub-document a section holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Physiology,
    Sociology,
    Psychology,
}

impl SectionKind {
    /// Keys every section of this kind must carry. Anything else is passed
    /// through untouched.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Physiology => &["height", "build"],
            Self::Sociology => &["occupation", "background"],
            Self::Psychology => &["motivations", "fears"],
        }
    }
}

fn default_section_version() -> u32 {
    1
}

/// An opaque, versioned sub-document of the detailed tier.
///
/// Its shape depends on whatever produced it; the model only checks the
/// required keys of its [`SectionKind`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtendedSection {
    #[serde(default = "default_section_version")]
    pub version: u32,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ExtendedSection {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            version: default_section_version(),
            fields,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Required keys of `kind` that are absent or null.
    pub fn missing_keys(&self, kind: SectionKind) -> Vec<&'static str> {
        kind.required_keys()
            .iter()
            .copied()
            .filter(|key| matches!(self.fields.get(*key), None | Some(Value::Null)))
            .collect()
    }
}

/// One step in a character's arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStage {
    pub phase: String,
    pub change: String,
    #[serde(default)]
    pub trigger: Option<String>,
}

/// Present only at the detailed tier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetailedProfile {
    pub physiology: ExtendedSection,
    pub sociology: ExtendedSection,
    pub psychology: ExtendedSection,
    #[serde(default)]
    pub evolution: Option<Vec<EvolutionStage>>,
    #[serde(default)]
    pub relationships: Option<Vec<Relationship>>,
}

impl DetailedProfile {
    pub fn sections(&self) -> [(SectionKind, &ExtendedSection); 3] {
        [
            (SectionKind::Physiology, &self.physiology),
            (SectionKind::Sociology, &self.sociology),
            (SectionKind::Psychology, &self.psychology),
        ]
    }

    /// Fails on the first section missing one of its required keys.
    pub fn check_required_keys(&self) -> Result<(), ModelError> {
        for (kind, section) in self.sections() {
            let keys = section.missing_keys(kind);
            if !keys.is_empty() {
                return Err(ModelError::MissingSectionKeys {
                    section: kind,
                    keys,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// True when the content came from automated generation rather than a
    /// human author.
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub last_edited_by: Option<Authorship>,
}

impl CharacterMetadata {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            ai_generated: false,
            last_edited_by: None,
        }
    }
}

/// A story character at some complexity tier.
///
/// Invariant: `balanced` is present iff `tier >= Balanced`, `detailed` is
/// present iff `tier == Detailed`. See [`Character::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub role: NarrativeRole,
    pub tier: ComplexityTier,
    pub basic: BasicInfo,
    #[serde(default)]
    pub balanced: Option<BalancedProfile>,
    #[serde(default)]
    pub detailed: Option<DetailedProfile>,
    pub metadata: CharacterMetadata,
}

impl Character {
    /// A new minimal-tier character.
    pub fn minimal(
        name: impl Into<String>,
        role: NarrativeRole,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            role,
            tier: ComplexityTier::Minimal,
            basic: BasicInfo {
                description: description.into(),
                ..BasicInfo::default()
            },
            balanced: None,
            detailed: None,
            metadata: CharacterMetadata::new(now),
        }
    }

    /// Check the tier/payload invariant.
    pub fn validate(&self) -> Result<(), ModelError> {
        let tier = self.tier;
        match (tier >= ComplexityTier::Balanced, self.balanced.is_some()) {
            (true, false) => {
                return Err(ModelError::MissingPayload {
                    tier,
                    section: "balanced",
                })
            }
            (false, true) => {
                return Err(ModelError::UnexpectedPayload {
                    tier,
                    section: "balanced",
                })
            }
            _ => {}
        }
        match (tier == ComplexityTier::Detailed, &self.detailed) {
            (true, None) => Err(ModelError::MissingPayload {
                tier,
                section: "detailed",
            }),
            (false, Some(_)) => Err(ModelError::UnexpectedPayload {
                tier,
                section: "detailed",
            }),
            (true, Some(detailed)) => detailed.check_required_keys(),
            (false, None) => Ok(()),
        }
    }

    /// Derive a new, independent character at `target` tier or below.
    ///
    /// Payloads the target tier does not allow are dropped. The result gets a
    /// fresh id and timestamps; `self` is left alone.
    pub fn derive_at_tier(
        &self,
        target: ComplexityTier,
        now: DateTime<Utc>,
    ) -> Result<Character, ModelError> {
        if target > self.tier {
            return Err(ModelError::CannotDeriveUpward {
                from: self.tier,
                to: target,
            });
        }

        let mut derived = self.clone();
        derived.id = CharacterId::new();
        derived.tier = target;
        if target < ComplexityTier::Detailed {
            derived.detailed = None;
        }
        if target < ComplexityTier::Balanced {
            derived.balanced = None;
        }
        derived.metadata = CharacterMetadata {
            ai_generated: self.metadata.ai_generated,
            ..CharacterMetadata::new(now)
        };
        Ok(derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn section(value: Value) -> ExtendedSection {
        match value {
            Value::Object(map) => ExtendedSection::new(map),
            _ => ExtendedSection::default(),
        }
    }

    fn detailed_profile() -> DetailedProfile {
        DetailedProfile {
            physiology: section(json!({"height": "6'1\"", "build": "wiry", "scar": "left brow"})),
            sociology: section(json!({"occupation": "ferry pilot", "background": "harbor town"})),
            psychology: section(json!({"motivations": ["debt"], "fears": ["open water"]})),
            evolution: None,
            relationships: None,
        }
    }

    #[test]
    fn minimal_is_valid() {
        let c = Character::minimal("Mara", NarrativeRole::Protagonist, "A ferry pilot", now());
        assert_eq!(c.tier, ComplexityTier::Minimal);
        assert!(c.validate().is_ok());
        assert_eq!(c.metadata.created_at, c.metadata.updated_at);
    }

    #[test]
    fn balanced_tier_requires_payload() {
        let mut c = Character::minimal("Mara", NarrativeRole::Protagonist, "A ferry pilot", now());
        c.tier = ComplexityTier::Balanced;
        assert_eq!(
            c.validate(),
            Err(ModelError::MissingPayload {
                tier: ComplexityTier::Balanced,
                section: "balanced"
            })
        );
        c.balanced = Some(BalancedProfile::default());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn minimal_tier_rejects_payload() {
        let mut c = Character::minimal("Mara", NarrativeRole::Protagonist, "A ferry pilot", now());
        c.balanced = Some(BalancedProfile::default());
        assert!(matches!(
            c.validate(),
            Err(ModelError::UnexpectedPayload { section: "balanced", .. })
        ));
    }

    #[test]
    fn detailed_sections_need_required_keys() {
        let mut c = Character::minimal("Mara", NarrativeRole::Protagonist, "A ferry pilot", now());
        c.tier = ComplexityTier::Detailed;
        c.balanced = Some(BalancedProfile::default());
        let mut detailed = detailed_profile();
        detailed.sociology.fields.remove("background");
        c.detailed = Some(detailed);
        assert_eq!(
            c.validate(),
            Err(ModelError::MissingSectionKeys {
                section: SectionKind::Sociology,
                keys: vec!["background"]
            })
        );

        c.detailed = Some(detailed_profile());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn extra_section_keys_pass_through() {
        let detailed = detailed_profile();
        let text = serde_json::to_string(&detailed).unwrap();
        let back: DetailedProfile = serde_json::from_str(&text).unwrap();
        assert_eq!(back.physiology.get("scar"), Some(&json!("left brow")));
        assert_eq!(back.physiology.version, 1);
    }

    #[test]
    fn derive_lower_tier_is_new_entity() {
        let mut c = Character::minimal("Mara", NarrativeRole::Protagonist, "A ferry pilot", now());
        c.tier = ComplexityTier::Detailed;
        c.balanced = Some(BalancedProfile::default());
        c.detailed = Some(detailed_profile());
        c.metadata.last_edited_by = Some(Authorship::User);

        let later = now() + chrono::Duration::hours(1);
        let derived = c.derive_at_tier(ComplexityTier::Balanced, later).unwrap();
        assert_ne!(derived.id, c.id);
        assert_eq!(derived.tier, ComplexityTier::Balanced);
        assert!(derived.balanced.is_some());
        assert!(derived.detailed.is_none());
        assert_eq!(derived.metadata.created_at, later);
        assert!(derived.metadata.last_edited_by.is_none());
        assert!(derived.validate().is_ok());

        // source untouched
        assert_eq!(c.tier, ComplexityTier::Detailed);
        assert!(c.detailed.is_some());
    }

    #[test]
    fn derive_upward_is_rejected() {
        let c = Character::minimal("Mara", NarrativeRole::Protagonist, "A ferry pilot", now());
        assert_eq!(
            c.derive_at_tier(ComplexityTier::Balanced, now()),
            Err(ModelError::CannotDeriveUpward {
                from: ComplexityTier::Minimal,
                to: ComplexityTier::Balanced
            })
        );
    }

    #[test]
    fn role_serde_names() {
        let json = serde_json::to_string(&NarrativeRole::SecondaryAntagonist).unwrap();
        assert_eq!(json, "\"secondary-antagonist\"");
        assert_eq!(NarrativeRole::LoveInterest.as_str(), "love-interest");
        let tier: ComplexityTier = serde_json::from_str("\"detailed\"").unwrap();
        assert_eq!(tier, ComplexityTier::Detailed);
    }

    #[test]
    fn tier_ordering() {
        assert!(ComplexityTier::Minimal < ComplexityTier::Balanced);
        assert!(ComplexityTier::Balanced < ComplexityTier::Detailed);
    }
}
