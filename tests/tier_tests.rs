/// Tier integration tests — cast members elaborated through both
/// transitions with the seeded synthesizer.

use chrono::{Duration, TimeZone, Utc};
use story_engine::core::emptiness::{collapsed_sections, CharacterSection};
use story_engine::core::synthesis::ArchetypeSynthesizer;
use story_engine::core::tiers::{upgrade_next, TransitionContext, TransitionError};
use story_engine::schema::cast::CastSheet;
use story_engine::schema::character::{Authorship, Character, ComplexityTier};
use std::path::Path;

fn cast_characters() -> Vec<Character> {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    CastSheet::load_from_ron(Path::new("tests/fixtures/harbor_cast.ron"))
        .unwrap()
        .characters(created)
}

fn context(references: Vec<Character>) -> TransitionContext {
    TransitionContext::new(Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap())
        .with_story_context("the winter the ferries stopped running")
        .with_references(references)
}

#[test]
fn whole_cast_reaches_detailed() {
    let cast = cast_characters();
    let synth = ArchetypeSynthesizer::new(2024);

    for character in &cast {
        let others: Vec<Character> = cast.iter().filter(|c| c.id != character.id).cloned().collect();
        let ctx = context(others);

        let balanced = upgrade_next(character, &ctx, &synth);
        assert!(balanced.success, "{}: {:?}", character.name, balanced.error);
        assert!(balanced.changes.iter().any(|c| c == "balanced.backstory"));

        let detailed = upgrade_next(&balanced.character, &ctx, &synth);
        assert!(detailed.success, "{}: {:?}", character.name, detailed.error);
        assert!(detailed.changes.iter().any(|c| c == "detailed.sociology"));

        let result = detailed.character;
        assert_eq!(result.id, character.id);
        assert_eq!(result.tier, ComplexityTier::Detailed);
        assert_eq!(result.metadata.created_at, character.metadata.created_at);
        assert_eq!(result.metadata.updated_at, ctx.now);
        assert!(result.metadata.ai_generated);
        assert_eq!(result.metadata.last_edited_by, Some(Authorship::Automated));
        assert!(result.validate().is_ok());

        let relationships = result.detailed.as_ref().unwrap().relationships.as_ref().unwrap();
        assert_eq!(relationships.len(), cast.len() - 1);

        // a fully elaborated character has nothing to collapse
        assert!(collapsed_sections(&result).is_empty(), "{}", result.name);

        let stuck = upgrade_next(&result, &ctx, &synth);
        assert!(!stuck.success);
        assert_eq!(stuck.character, result);
        assert_eq!(
            stuck.error,
            Some(TransitionError::AlreadyAtTop(ComplexityTier::Detailed))
        );
    }
}

#[test]
fn same_seed_same_cast() {
    let cast = cast_characters();
    let ctx = context(Vec::new());
    let a = upgrade_next(&cast[0], &ctx, &ArchetypeSynthesizer::new(11));
    let b = upgrade_next(&cast[0], &ctx, &ArchetypeSynthesizer::new(11));
    assert_eq!(a.character, b.character);
    assert_eq!(a.changes, b.changes);
}

#[test]
fn derived_copy_is_independent() {
    let cast = cast_characters();
    let synth = ArchetypeSynthesizer::new(5);
    let ctx = context(Vec::new());
    let balanced = upgrade_next(&cast[2], &ctx, &synth).character;
    let detailed = upgrade_next(&balanced, &ctx, &synth).character;

    let later = ctx.now + Duration::days(3);
    let copy = detailed.derive_at_tier(ComplexityTier::Minimal, later).unwrap();
    assert_ne!(copy.id, detailed.id);
    assert_eq!(copy.tier, ComplexityTier::Minimal);
    assert!(copy.balanced.is_none() && copy.detailed.is_none());
    assert_eq!(copy.basic, detailed.basic);
    assert_eq!(copy.metadata.created_at, later);
    assert!(copy.validate().is_ok());
    assert_eq!(collapsed_sections(&copy), Vec::<CharacterSection>::new());

    // the copy can climb again on its own
    let again = upgrade_next(&copy, &ctx, &synth);
    assert!(again.success);
    assert_eq!(detailed.tier, ComplexityTier::Detailed);
}
