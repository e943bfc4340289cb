/// Offline, seeded synthesizer that fills the next tier with deterministic
/// stock content.
///
/// Not a writer: it picks from one small table so unattended upgrades and
/// previews work without a generation service. Same seed, same character,
/// same context: same output.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::{json, Map, Value};

use crate::core::emptiness::is_empty_text;
use crate::core::tiers::{SynthesisError, Synthesizer, TransitionContext};
use crate::schema::character::{
    BalancedProfile, Character, CorePsychology, DetailedProfile, EvolutionStage, ExtendedSection,
    NarrativeRole, SimplifiedPhysiology, VoiceProfile,
};
use crate::schema::relationship::Relationship;

const AGES: &[&str] = &["early 20s", "early 30s", "mid-40s", "late 50s"];
const APPEARANCES: &[&str] = &[
    "weathered hands and a watchful stare",
    "sharp-featured, always slightly underslept",
    "open face, quick to laugh",
];
const VALUES: &[&str] = &["freedom", "loyalty", "truth", "control", "family"];
const WANTS: &[&str] = &["prove themselves", "win back what was lost", "keep everyone safe"];
const NEEDS: &[&str] = &["let other people in", "forgive themselves", "stop running"];
const FLAWS: &[&str] = &["pride", "recklessness", "secrecy", "jealousy"];
const FEARS: &[&str] = &["abandonment", "failure", "being trapped", "irrelevance"];
const SPEECH: &[&str] = &["quick and direct", "slow, chooses every word", "dry understatement"];
const OCCUPATIONS: &[&str] = &["courier", "mechanic", "schoolteacher", "harbor pilot"];
const HEIGHTS: &[&str] = &["5'2\"", "5'6\"", "5'10\"", "6'1\""];
const BUILDS: &[&str] = &["slight", "wiry", "solid", "heavyset"];

fn pick(rng: &mut StdRng, pool: &[&str]) -> String {
    pool.choose(rng).copied().unwrap_or_default().to_string()
}

fn pick_many(rng: &mut StdRng, pool: &[&str], n: usize) -> Vec<String> {
    pool.choose_multiple(rng, n).map(|s| s.to_string()).collect()
}

/// Authored entries of `values`, or `n` picks from `pool` when there are none.
fn authored_or_pick(values: &[String], rng: &mut StdRng, pool: &[&str], n: usize) -> Vec<String> {
    let authored: Vec<String> = values
        .iter()
        .filter(|v| !v.trim().is_empty() && !is_empty_text(Some(v.as_str())))
        .cloned()
        .collect();
    if authored.is_empty() {
        pick_many(rng, pool, n)
    } else {
        authored
    }
}

/// Relationship label used for a reference character's role.
fn relationship_label(role: NarrativeRole) -> &'static str {
    use NarrativeRole::*;
    match role {
        Mentor | Threshold => "mentor",
        Antagonist | SecondaryAntagonist => "antagonist",
        Rival => "rival",
        Family => "family",
        LoveInterest => "love interest",
        Friend | Ally => "friend",
        AuthorityFigure => "professional",
        _ => "complicated",
    }
}

/// Seeded, table-driven [`Synthesizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchetypeSynthesizer {
    pub seed: u64,
}

impl ArchetypeSynthesizer {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, character: &Character, salt: u64) -> StdRng {
        let id_bits = character.id.0.as_u128() as u64;
        StdRng::seed_from_u64(self.seed ^ id_bits ^ salt)
    }

    fn source_text(character: &Character) -> Result<&str, SynthesisError> {
        let description = character.basic.description.trim();
        if description.is_empty() || is_empty_text(Some(description)) {
            return Err(SynthesisError::InsufficientSource(character.name.clone()));
        }
        Ok(description.trim_end_matches('.'))
    }
}

impl Synthesizer for ArchetypeSynthesizer {
    fn balanced_profile(
        &self,
        character: &Character,
        context: &TransitionContext,
    ) -> Result<BalancedProfile, SynthesisError> {
        let description = Self::source_text(character)?;
        let mut rng = self.rng_for(character, 1);

        let mut backstory = format!("{description}.");
        if let Some(story) = context.story_context.as_deref().filter(|s| !s.trim().is_empty()) {
            backstory.push_str(&format!(" Their past is bound up with {}.", story.trim()));
        }
        if let Some(reference) = context
            .reference_characters
            .iter()
            .find(|r| r.id != character.id)
        {
            backstory.push_str(&format!(
                " Much of who they are was shaped around {}.",
                reference.name
            ));
        }

        Ok(BalancedProfile {
            physiology: SimplifiedPhysiology {
                age: pick(&mut rng, AGES),
                gender: "unspecified".to_string(),
                appearance: pick(&mut rng, APPEARANCES),
                ..SimplifiedPhysiology::default()
            },
            psychology: CorePsychology {
                core_value: pick(&mut rng, VALUES),
                want: pick(&mut rng, WANTS),
                need: pick(&mut rng, NEEDS),
                primary_flaw: pick(&mut rng, FLAWS),
                key_fears: pick_many(&mut rng, FEARS, 2),
                ..CorePsychology::default()
            },
            backstory,
            voice: VoiceProfile {
                speech_pattern: pick(&mut rng, SPEECH),
                ..VoiceProfile::default()
            },
        })
    }

    /// Builds on the balanced payload, falling back to the table wherever
    /// that payload holds nothing authored.
    fn detailed_profile(
        &self,
        character: &Character,
        context: &TransitionContext,
    ) -> Result<DetailedProfile, SynthesisError> {
        let description = Self::source_text(character)?;
        let balanced = character
            .balanced
            .as_ref()
            .ok_or_else(|| SynthesisError::InsufficientSource(character.name.clone()))?;
        let mut rng = self.rng_for(character, 2);
        let psychology = &balanced.psychology;

        let build = balanced
            .physiology
            .build
            .clone()
            .filter(|b| !is_empty_text(Some(b.as_str())))
            .unwrap_or_else(|| pick(&mut rng, BUILDS));
        let background = if is_empty_text(Some(balanced.backstory.trim())) {
            format!("{description}.")
        } else {
            balanced.backstory.clone()
        };
        let motivations = authored_or_pick(
            &[psychology.want.clone(), psychology.need.clone()],
            &mut rng,
            WANTS,
            1,
        );
        let fears = authored_or_pick(&psychology.key_fears, &mut rng, FEARS, 2);

        let relationships: Vec<Relationship> = context
            .reference_characters
            .iter()
            .filter(|r| r.id != character.id)
            .map(|r| Relationship::new(&character.name, &r.name, relationship_label(r.role)))
            .collect();

        Ok(DetailedProfile {
            physiology: section(json!({ "height": pick(&mut rng, HEIGHTS), "build": build })),
            sociology: section(json!({
                "occupation": pick(&mut rng, OCCUPATIONS),
                "background": background,
            })),
            psychology: section(json!({ "motivations": motivations, "fears": fears })),
            evolution: Some(vec![
                EvolutionStage {
                    phase: "setup".to_string(),
                    change: format!("Chases the wish to {}", motivations[0]),
                    trigger: None,
                },
                EvolutionStage {
                    phase: "resolution".to_string(),
                    change: format!("Faces their fear of {}", fears[0]),
                    trigger: context.story_context.clone(),
                },
            ]),
            relationships: (!relationships.is_empty()).then_some(relationships),
        })
    }
}

fn section(value: Value) -> ExtendedSection {
    match value {
        Value::Object(fields) => ExtendedSection::new(fields),
        _ => ExtendedSection::new(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tiers::{upgrade, upgrade_next, Transition, TransitionError};
    use crate::schema::character::ComplexityTier;
    use chrono::{TimeZone, Utc};

    fn ctx() -> TransitionContext {
        TransitionContext::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    }

    fn mara() -> Character {
        Character::minimal(
            "Mara",
            NarrativeRole::Protagonist,
            "A ferry pilot who owes money to half the harbor.",
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn deterministic_for_same_seed() {
        let synth = ArchetypeSynthesizer::new(42);
        let c = mara();
        let a = synth.balanced_profile(&c, &ctx()).unwrap();
        let b = synth.balanced_profile(&c, &ctx()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn backstory_uses_description_and_context() {
        let synth = ArchetypeSynthesizer::new(7);
        let eli = Character::minimal("Eli", NarrativeRole::Mentor, "Old harbor master", ctx().now);
        let context = ctx()
            .with_story_context("the night the lighthouse went dark")
            .with_references(vec![eli]);
        let profile = synth.balanced_profile(&mara(), &context).unwrap();
        assert!(profile
            .backstory
            .starts_with("A ferry pilot who owes money to half the harbor."));
        assert!(profile.backstory.contains("the night the lighthouse went dark"));
        assert!(profile.backstory.contains("Eli"));
    }

    #[test]
    fn blank_description_is_insufficient() {
        let synth = ArchetypeSynthesizer::new(1);
        let mut c = mara();
        c.basic.description = "TBD".to_string();
        assert_eq!(
            synth.balanced_profile(&c, &ctx()),
            Err(SynthesisError::InsufficientSource("Mara".to_string()))
        );

        let result = upgrade(&c, Transition::MinimalToBalanced, &ctx(), &synth);
        assert!(!result.success);
        assert_eq!(result.character, c);
        assert!(matches!(result.error, Some(TransitionError::Synthesis(_))));
    }

    #[test]
    fn full_climb_through_tiers() {
        let synth = ArchetypeSynthesizer::new(99);
        let jonah = Character::minimal("Jonah", NarrativeRole::Rival, "Runs the rival ferry", ctx().now);
        let context = ctx().with_references(vec![jonah]);

        let balanced = upgrade(&mara(), Transition::MinimalToBalanced, &context, &synth);
        assert!(balanced.success, "{:?}", balanced.error);
        assert_eq!(balanced.character.tier, ComplexityTier::Balanced);

        let detailed = upgrade(
            &balanced.character,
            Transition::BalancedToDetailed,
            &context,
            &synth,
        );
        assert!(detailed.success, "{:?}", detailed.error);
        let c = detailed.character;
        assert_eq!(c.tier, ComplexityTier::Detailed);
        assert!(c.validate().is_ok());

        let profile = c.detailed.unwrap();
        assert_eq!(profile.evolution.as_ref().map(Vec::len), Some(2));
        let relationships = profile.relationships.unwrap();
        assert_eq!(relationships.len(), 1);
        assert!(relationships[0].connects("Mara", "Jonah"));
        assert_eq!(relationships[0].relationship_type, "rival");
    }

    #[test]
    fn hand_written_balanced_without_fears_reaches_detailed() {
        let mut c = mara();
        c.tier = ComplexityTier::Balanced;
        c.balanced = Some(BalancedProfile {
            physiology: SimplifiedPhysiology {
                age: "mid-30s".to_string(),
                gender: "female".to_string(),
                appearance: "rope-scarred hands".to_string(),
                ..SimplifiedPhysiology::default()
            },
            psychology: CorePsychology {
                core_value: "independence".to_string(),
                want: "clear her debts".to_string(),
                need: "accept help".to_string(),
                primary_flaw: "pride".to_string(),
                key_fears: vec!["unknown".to_string()],
                ..CorePsychology::default()
            },
            backstory: "TBD".to_string(),
            voice: VoiceProfile {
                speech_pattern: "clipped".to_string(),
                ..VoiceProfile::default()
            },
        });
        assert!(c.validate().is_ok());

        let result = upgrade_next(&c, &ctx(), &ArchetypeSynthesizer::new(1));
        assert!(result.success, "{:?}", result.error);
        let detailed = result.character.detailed.unwrap();
        let fears = detailed.psychology.get("fears").and_then(Value::as_array).unwrap();
        assert_eq!(fears.len(), 2);
        assert!(fears.iter().all(|f| f != "unknown"));
        assert_eq!(
            detailed.sociology.get("background"),
            Some(&json!("A ferry pilot who owes money to half the harbor."))
        );
        assert_eq!(
            detailed.psychology.get("motivations"),
            Some(&json!(["clear her debts", "accept help"]))
        );
    }

    #[test]
    fn detailed_requires_balanced_payload() {
        let synth = ArchetypeSynthesizer::new(3);
        assert!(matches!(
            synth.detailed_profile(&mara(), &ctx()),
            Err(SynthesisError::InsufficientSource(_))
        ));
    }
}
