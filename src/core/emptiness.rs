/// Placeholder-aware emptiness checks.
///
/// Decides whether a field holds authored content or only filler such as
/// "TBD" or "unknown". Everything that needs that distinction goes through
/// these functions so there is one definition of "empty".
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::character::Character;

/// Values that count as empty after trimming and lowercasing.
pub const PLACEHOLDER_VALUES: [&str; 9] = [
    "tbd",
    "to be defined",
    "to be determined",
    "n/a",
    "none",
    "unknown",
    "average",
    "good",
    "middle class",
];

/// Bookkeeping keys that never count as content in extended sections.
pub const SECTION_IGNORED_FIELDS: [&str; 1] = ["version"];

/// Returns true if `text` is one of the placeholder values.
pub fn is_placeholder(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    PLACEHOLDER_VALUES.contains(&normalized.as_str())
}

/// A scalar text field is empty if absent, `""`, or a placeholder.
pub fn is_empty_text(text: Option<&str>) -> bool {
    match text {
        None => true,
        Some(s) => s.is_empty() || is_placeholder(s),
    }
}

/// Recursive emptiness over a JSON value.
///
/// - null, `false`, `0` and `""` are empty, as are placeholder strings;
/// - an array is empty if every element is (so `[]` is empty);
/// - an object is empty if every field not named in `ignore` is.
///
/// `ignore` applies at every nesting level.
pub fn is_empty_value(value: &Value, ignore: &[&str]) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0 || f.is_nan()),
        Value::String(s) => is_empty_text(Some(s)),
        Value::Array(items) => items.iter().all(|item| is_empty_value(item, ignore)),
        Value::Object(fields) => fields
            .iter()
            .filter(|(key, _)| !ignore.contains(&key.as_str()))
            .all(|(_, field)| is_empty_value(field, ignore)),
    }
}

/// [`is_empty_value`] over any serializable record.
///
/// A record that fails to serialize is treated as authored content.
pub fn is_empty_record<T: Serialize + ?Sized>(record: &T, ignore: &[&str]) -> bool {
    serde_json::to_value(record).map_or(false, |value| is_empty_value(&value, ignore))
}

/// A collapsible section of a character sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterSection {
    Basic,
    Physiology,
    Psychology,
    Backstory,
    Voice,
    ExtendedPhysiology,
    ExtendedSociology,
    ExtendedPsychology,
    Evolution,
    Relationships,
}

/// Default collapse state for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionState {
    pub section: CharacterSection,
    pub collapsed: bool,
}

/// Default collapse state of every section the character's tier carries.
///
/// Sections holding only placeholders start collapsed.
pub fn section_states(character: &Character) -> Vec<SectionState> {
    let mut states = vec![SectionState {
        section: CharacterSection::Basic,
        collapsed: is_empty_record(&character.basic, &[]),
    }];

    if let Some(balanced) = &character.balanced {
        states.extend([
            SectionState {
                section: CharacterSection::Physiology,
                collapsed: is_empty_record(&balanced.physiology, &[]),
            },
            SectionState {
                section: CharacterSection::Psychology,
                collapsed: is_empty_record(&balanced.psychology, &[]),
            },
            SectionState {
                section: CharacterSection::Backstory,
                collapsed: is_empty_text(Some(&balanced.backstory)),
            },
            SectionState {
                section: CharacterSection::Voice,
                collapsed: is_empty_record(&balanced.voice, &[]),
            },
        ]);
    }

    if let Some(detailed) = &character.detailed {
        states.extend([
            SectionState {
                section: CharacterSection::ExtendedPhysiology,
                collapsed: is_empty_record(&detailed.physiology, &SECTION_IGNORED_FIELDS),
            },
            SectionState {
                section: CharacterSection::ExtendedSociology,
                collapsed: is_empty_record(&detailed.sociology, &SECTION_IGNORED_FIELDS),
            },
            SectionState {
                section: CharacterSection::ExtendedPsychology,
                collapsed: is_empty_record(&detailed.psychology, &SECTION_IGNORED_FIELDS),
            },
            SectionState {
                section: CharacterSection::Evolution,
                collapsed: is_empty_record(&detailed.evolution, &[]),
            },
            SectionState {
                section: CharacterSection::Relationships,
                collapsed: is_empty_record(&detailed.relationships, &[]),
            },
        ]);
    }

    states
}

/// Sections that start collapsed.
pub fn collapsed_sections(character: &Character) -> Vec<CharacterSection> {
    section_states(character)
        .into_iter()
        .filter(|state| state.collapsed)
        .map(|state| state.section)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::character::{
        BalancedProfile, ComplexityTier, NarrativeRole, SimplifiedPhysiology,
    };
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn placeholder_vocabulary() {
        assert!(is_placeholder("TBD"));
        assert!(is_placeholder("  To Be Determined "));
        assert!(is_placeholder("N/A"));
        assert!(is_placeholder("Middle Class"));
        assert!(!is_placeholder("Tall and athletic"));
        assert!(!is_placeholder("goodish"));
    }

    #[test]
    fn scalar_emptiness() {
        assert!(is_empty_text(Some("TBD")));
        assert!(is_empty_text(Some("")));
        assert!(is_empty_text(None));
        assert!(is_empty_text(Some("good")));
        assert!(!is_empty_text(Some("Tall and athletic")));
    }

    #[test]
    fn json_falsy_values() {
        assert!(is_empty_value(&Value::Null, &[]));
        assert!(is_empty_value(&json!(false), &[]));
        assert!(is_empty_value(&json!(0), &[]));
        assert!(!is_empty_value(&json!(true), &[]));
        assert!(!is_empty_value(&json!(34), &[]));
    }

    #[test]
    fn collections() {
        assert!(is_empty_value(&json!([]), &[]));
        assert!(is_empty_value(&json!(["tbd", "", null]), &[]));
        assert!(!is_empty_value(&json!(["tbd", "stubborn"]), &[]));
    }

    #[test]
    fn nested_object_of_placeholders_is_empty() {
        let value = json!({
            "appearance": "average",
            "details": { "health": "good", "class": "middle class", "notes": [] },
            "age": null
        });
        assert!(is_empty_value(&value, &[]));

        let authored = json!({
            "appearance": "average",
            "details": { "health": "walks with a cane" }
        });
        assert!(!is_empty_value(&authored, &[]));
    }

    #[test]
    fn ignore_list_applies_at_every_level() {
        let value = json!({ "version": 3, "inner": { "version": 2, "text": "tbd" } });
        assert!(!is_empty_value(&value, &[]));
        assert!(is_empty_value(&value, &["version"]));
    }

    #[test]
    fn typed_record() {
        let physiology = SimplifiedPhysiology {
            age: "unknown".to_string(),
            gender: String::new(),
            appearance: "Average".to_string(),
            build: Some("TBD".to_string()),
            health: None,
            key_traits: vec![],
        };
        assert!(is_empty_record(&physiology, &[]));
    }

    #[test]
    fn placeholder_balanced_sections_collapse() {
        let mut c = Character::minimal(
            "Mara",
            NarrativeRole::Protagonist,
            "A ferry pilot who owes everyone money",
            Utc::now(),
        );
        c.tier = ComplexityTier::Balanced;
        let mut balanced = BalancedProfile::default();
        balanced.physiology.appearance = "TBD".to_string();
        balanced.backstory = "Grew up on the docks.".to_string();
        c.balanced = Some(balanced);

        let collapsed = collapsed_sections(&c);
        assert!(!collapsed.contains(&CharacterSection::Basic));
        assert!(collapsed.contains(&CharacterSection::Physiology));
        assert!(collapsed.contains(&CharacterSection::Psychology));
        assert!(!collapsed.contains(&CharacterSection::Backstory));
        assert!(collapsed.contains(&CharacterSection::Voice));
        assert!(!collapsed.contains(&CharacterSection::Evolution));
        assert_eq!(section_states(&c).len(), 5);
    }
}
