/// Tier transitions — moving a character from minimal to balanced to
/// detailed.
///
/// A transition asks a [`Synthesizer`] for the payload the next tier needs,
/// checks it, and commits it in one step. Any failure hands back the input
/// character untouched.
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::core::emptiness::{is_empty_text, is_empty_value};
use crate::schema::character::{
    Authorship, BalancedProfile, Character, ComplexityTier, DetailedProfile, ModelError,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisError {
    #[error("not enough source material to elaborate '{0}'")]
    InsufficientSource(String),
    #[error("synthesizer unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("{transition} expects a {expected:?} character, got {actual:?}")]
    WrongTier {
        transition: Transition,
        expected: ComplexityTier,
        actual: ComplexityTier,
    },
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("synthesized profile is missing required fields: {0:?}")]
    IncompleteProfile(Vec<String>),
    #[error("character model violated: {0}")]
    Model(#[from] ModelError),
    #[error("{0:?} is the highest tier")]
    AlreadyAtTop(ComplexityTier),
}

/// The two forward steps between tiers. There are no skips and no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    MinimalToBalanced,
    BalancedToDetailed,
}

impl Transition {
    pub fn from(&self) -> ComplexityTier {
        match self {
            Self::MinimalToBalanced => ComplexityTier::Minimal,
            Self::BalancedToDetailed => ComplexityTier::Balanced,
        }
    }

    pub fn to(&self) -> ComplexityTier {
        match self {
            Self::MinimalToBalanced => ComplexityTier::Balanced,
            Self::BalancedToDetailed => ComplexityTier::Detailed,
        }
    }

    /// The transition leaving `tier`, if any.
    pub fn from_tier(tier: ComplexityTier) -> Option<Transition> {
        match tier {
            ComplexityTier::Minimal => Some(Self::MinimalToBalanced),
            ComplexityTier::Balanced => Some(Self::BalancedToDetailed),
            ComplexityTier::Detailed => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MinimalToBalanced => "minimal-to-balanced",
            Self::BalancedToDetailed => "balanced-to-detailed",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs a synthesizer may draw on, plus the clock reading stamped on the
/// result.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    pub reference_characters: Vec<Character>,
    pub story_context: Option<String>,
    /// Accept synthesized content without review. Required fields then only
    /// need to be non-blank; otherwise placeholder filler fails the
    /// transition.
    pub auto_accept: bool,
    pub now: DateTime<Utc>,
}

impl TransitionContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            reference_characters: Vec::new(),
            story_context: None,
            auto_accept: false,
            now,
        }
    }

    pub fn with_references(mut self, characters: Vec<Character>) -> Self {
        self.reference_characters = characters;
        self
    }

    pub fn with_story_context(mut self, story: impl Into<String>) -> Self {
        self.story_context = Some(story.into());
        self
    }

    pub fn auto_accept(mut self, auto_accept: bool) -> Self {
        self.auto_accept = auto_accept;
        self
    }
}

/// Produces the payload a character needs for its next tier.
///
/// Usually backed by a generation service; see
/// [`crate::core::synthesis::ArchetypeSynthesizer`] for an offline one.
#[cfg_attr(test, mockall::automock)]
pub trait Synthesizer {
    fn balanced_profile(
        &self,
        character: &Character,
        context: &TransitionContext,
    ) -> Result<BalancedProfile, SynthesisError>;

    fn detailed_profile(
        &self,
        character: &Character,
        context: &TransitionContext,
    ) -> Result<DetailedProfile, SynthesisError>;
}

/// Outcome of a transition. On failure `character` is the input, unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub success: bool,
    pub character: Character,
    /// `section.field` paths added or modified, metadata stamps included.
    pub changes: Vec<String>,
    pub error: Option<TransitionError>,
}

impl TransitionResult {
    fn succeeded(character: Character, changes: Vec<String>) -> Self {
        Self {
            success: true,
            character,
            changes,
            error: None,
        }
    }

    fn failed(character: Character, error: TransitionError) -> Self {
        Self {
            success: false,
            character,
            changes: Vec::new(),
            error: Some(error),
        }
    }
}

/// Run `transition` on `character`.
pub fn upgrade<S: Synthesizer + ?Sized>(
    character: &Character,
    transition: Transition,
    context: &TransitionContext,
    synthesizer: &S,
) -> TransitionResult {
    match try_upgrade(character, transition, context, synthesizer) {
        Ok(upgraded) => {
            let changes = changed_fields(character, &upgraded);
            tracing::debug!(
                "Applied {} to '{}': {} fields changed",
                transition,
                character.name,
                changes.len()
            );
            TransitionResult::succeeded(upgraded, changes)
        }
        Err(error) => {
            tracing::warn!("Rejected {} for '{}': {}", transition, character.name, error);
            TransitionResult::failed(character.clone(), error)
        }
    }
}

/// Run the transition leaving the character's current tier.
///
/// A detailed character has nowhere to go and comes back as a failure.
pub fn upgrade_next<S: Synthesizer + ?Sized>(
    character: &Character,
    context: &TransitionContext,
    synthesizer: &S,
) -> TransitionResult {
    match Transition::from_tier(character.tier) {
        Some(transition) => upgrade(character, transition, context, synthesizer),
        None => TransitionResult::failed(
            character.clone(),
            TransitionError::AlreadyAtTop(character.tier),
        ),
    }
}

fn try_upgrade<S: Synthesizer + ?Sized>(
    character: &Character,
    transition: Transition,
    context: &TransitionContext,
    synthesizer: &S,
) -> Result<Character, TransitionError> {
    if character.tier != transition.from() {
        return Err(TransitionError::WrongTier {
            transition,
            expected: transition.from(),
            actual: character.tier,
        });
    }
    character.validate()?;

    let mut upgraded = character.clone();
    match transition {
        Transition::MinimalToBalanced => {
            let profile = synthesizer.balanced_profile(character, context)?;
            check_balanced(&profile, context.auto_accept)?;
            upgraded.balanced = Some(profile);
        }
        Transition::BalancedToDetailed => {
            let profile = synthesizer.detailed_profile(character, context)?;
            profile.check_required_keys()?;
            check_detailed(&profile, context.auto_accept)?;
            upgraded.detailed = Some(profile);
        }
    }

    upgraded.tier = transition.to();
    upgraded.metadata.updated_at = context.now;
    upgraded.metadata.ai_generated = true;
    upgraded.metadata.last_edited_by = Some(Authorship::Automated);
    upgraded.validate()?;
    Ok(upgraded)
}

fn field_missing(value: &str, auto_accept: bool) -> bool {
    if auto_accept {
        value.trim().is_empty()
    } else {
        value.trim().is_empty() || is_empty_text(Some(value))
    }
}

fn check_balanced(profile: &BalancedProfile, auto_accept: bool) -> Result<(), TransitionError> {
    let required = [
        ("balanced.physiology.age", &profile.physiology.age),
        ("balanced.physiology.gender", &profile.physiology.gender),
        ("balanced.physiology.appearance", &profile.physiology.appearance),
        ("balanced.psychology.core_value", &profile.psychology.core_value),
        ("balanced.psychology.want", &profile.psychology.want),
        ("balanced.psychology.need", &profile.psychology.need),
        ("balanced.psychology.primary_flaw", &profile.psychology.primary_flaw),
        ("balanced.backstory", &profile.backstory),
        ("balanced.voice.speech_pattern", &profile.voice.speech_pattern),
    ];
    let missing: Vec<String> = required
        .iter()
        .filter(|(_, value)| field_missing(value, auto_accept))
        .map(|(path, _)| path.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(TransitionError::IncompleteProfile(missing))
    }
}

fn check_detailed(profile: &DetailedProfile, auto_accept: bool) -> Result<(), TransitionError> {
    if auto_accept {
        return Ok(());
    }
    let mut missing = Vec::new();
    for (kind, section) in profile.sections() {
        for key in kind.required_keys() {
            if section.get(key).map_or(true, |v| is_empty_value(v, &[])) {
                let kind_name = match serde_json::to_value(kind) {
                    Ok(Value::String(s)) => s,
                    _ => format!("{kind:?}").to_lowercase(),
                };
                missing.push(format!("detailed.{kind_name}.{key}"));
            }
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(TransitionError::IncompleteProfile(missing))
    }
}

/// `section.field` paths that differ between two versions of a character.
///
/// A section that appears whole is listed field by field, skipping fields
/// left null. Metadata stamps count like any other section.
pub fn changed_fields(before: &Character, after: &Character) -> Vec<String> {
    let (Ok(Value::Object(before)), Ok(Value::Object(after))) =
        (serde_json::to_value(before), serde_json::to_value(after))
    else {
        return Vec::new();
    };

    let mut changes = Vec::new();
    for (key, new_value) in &after {
        let old_value = before.get(key).unwrap_or(&Value::Null);
        if old_value == new_value {
            continue;
        }
        match (old_value, new_value) {
            (Value::Object(old), Value::Object(new)) => {
                for (sub, v) in new {
                    if old.get(sub) != Some(v) {
                        changes.push(format!("{key}.{sub}"));
                    }
                }
                for sub in old.keys().filter(|sub| !new.contains_key(*sub)) {
                    changes.push(format!("{key}.{sub}"));
                }
            }
            (Value::Null, Value::Object(new)) | (Value::Object(new), Value::Null) => {
                changes.extend(
                    new.iter()
                        .filter(|(_, v)| !v.is_null())
                        .map(|(sub, _)| format!("{key}.{sub}")),
                );
            }
            _ => changes.push(key.clone()),
        }
    }
    changes
}
