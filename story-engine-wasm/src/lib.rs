//! WASM bindings for story-engine — JSON in, JSON out, for the browser
//! renderer and character editor.

use chrono::{DateTime, Utc};
use wasm_bindgen::prelude::*;

use story_engine::core::classifier::RelationshipClassifier;
use story_engine::core::emptiness;
use story_engine::core::graph::GraphBuilder;
use story_engine::core::layout::{CircularLayout, Position};
use story_engine::core::pricing::{PricingEstimator, PricingTable};
use story_engine::core::synthesis::ArchetypeSynthesizer;
use story_engine::core::tiers::{upgrade_next, TransitionContext};
use story_engine::schema::character::Character;
use story_engine::schema::location::LocationSuggestion;
use story_engine::schema::relationship::Relationship;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Deserialize)]
struct CastInput {
    characters: Vec<Character>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(serde::Deserialize)]
struct ElaborateInput {
    character: Character,
    #[serde(default)]
    reference_characters: Vec<Character>,
    #[serde(default)]
    story_context: Option<String>,
    #[serde(default)]
    auto_accept: bool,
    now: DateTime<Utc>,
}

#[derive(serde::Serialize)]
struct ElaborateOutput {
    success: bool,
    character: Character,
    changes: Vec<String>,
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Engine handle
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct StoryEngine {
    builder: GraphBuilder,
    estimator: PricingEstimator,
    synthesizer: ArchetypeSynthesizer,
}

#[wasm_bindgen]
impl StoryEngine {
    /// Engine with the built-in style and pricing tables.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> StoryEngine {
        StoryEngine {
            builder: GraphBuilder::default(),
            estimator: PricingEstimator::default(),
            synthesizer: ArchetypeSynthesizer::new(seed),
        }
    }

    /// Replace the style table with one given as RON text.
    pub fn load_styles(&mut self, styles_ron: &str) -> Result<(), JsError> {
        let classifier = RelationshipClassifier::parse_ron(styles_ron)
            .map_err(|e| JsError::new(&format!("Style table error: {e}")))?;
        self.builder.classifier = classifier;
        Ok(())
    }

    /// Replace the pricing table with one given as RON text.
    pub fn load_pricing(&mut self, pricing_ron: &str) -> Result<(), JsError> {
        let table = PricingTable::parse_ron(pricing_ron)
            .map_err(|e| JsError::new(&format!("Pricing table error: {e}")))?;
        self.estimator = PricingEstimator::new(table);
        Ok(())
    }

    /// `{characters, relationships}` in, `{nodes, edges}` out.
    pub fn build_graph(&self, cast_json: &str) -> Result<String, JsError> {
        self.build_graph_json(cast_json).map_err(|e| JsError::new(&e))
    }

    /// Array of location suggestions in, the same array priced out.
    pub fn estimate_locations(&self, locations_json: &str) -> Result<String, JsError> {
        self.estimate_locations_json(locations_json)
            .map_err(|e| JsError::new(&e))
    }

    /// Move a character up one tier. The result JSON carries `success`,
    /// `character`, `changes` and `error`.
    pub fn elaborate(&self, input_json: &str) -> Result<String, JsError> {
        self.elaborate_json(input_json).map_err(|e| JsError::new(&e))
    }
}

// Private helpers
impl StoryEngine {
    fn build_graph_json(&self, cast_json: &str) -> Result<String, String> {
        let cast: CastInput =
            serde_json::from_str(cast_json).map_err(|e| format!("Invalid cast JSON: {e}"))?;
        let graph = self.builder.build(&cast.characters, &cast.relationships);
        serde_json::to_string(&graph).map_err(|e| format!("Serialization error: {e}"))
    }

    fn estimate_locations_json(&self, locations_json: &str) -> Result<String, String> {
        let suggestions: Vec<LocationSuggestion> = serde_json::from_str(locations_json)
            .map_err(|e| format!("Invalid locations JSON: {e}"))?;
        serde_json::to_string(&self.estimator.apply_all(suggestions))
            .map_err(|e| format!("Serialization error: {e}"))
    }

    fn elaborate_json(&self, input_json: &str) -> Result<String, String> {
        let input: ElaborateInput = serde_json::from_str(input_json)
            .map_err(|e| format!("Invalid elaborate JSON: {e}"))?;
        let mut context = TransitionContext::new(input.now)
            .with_references(input.reference_characters)
            .auto_accept(input.auto_accept);
        context.story_context = input.story_context;

        let result = upgrade_next(&input.character, &context, &self.synthesizer);
        let output = ElaborateOutput {
            success: result.success,
            character: result.character,
            changes: result.changes,
            error: result.error.map(|e| e.to_string()),
        };
        serde_json::to_string(&output).map_err(|e| format!("Serialization error: {e}"))
    }
}

// ---------------------------------------------------------------------------
// Stateless helpers
// ---------------------------------------------------------------------------

/// `[x, y]` in canvas percent for ring slot `index` of `total`.
#[wasm_bindgen]
pub fn layout_position(index: usize, total: usize) -> Vec<f64> {
    let Position { x, y } = CircularLayout::default().position(index, total);
    vec![x, y]
}

/// True for filler values such as "TBD" or "unknown".
#[wasm_bindgen]
pub fn is_placeholder(text: &str) -> bool {
    emptiness::is_placeholder(text)
}

/// JSON array of the sections of a character that should start collapsed.
#[wasm_bindgen]
pub fn collapsed_sections(character_json: &str) -> Result<String, JsError> {
    collapsed_sections_json(character_json).map_err(|e| JsError::new(&e))
}

fn collapsed_sections_json(character_json: &str) -> Result<String, String> {
    let character: Character = serde_json::from_str(character_json)
        .map_err(|e| format!("Invalid character JSON: {e}"))?;
    serde_json::to_string(&emptiness::collapsed_sections(&character))
        .map_err(|e| format!("Serialization error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use story_engine::schema::character::NarrativeRole;

    fn cast_json() -> String {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let characters = vec![
            Character::minimal("Mara", NarrativeRole::Protagonist, "A ferry pilot", now),
            Character::minimal("Jonah", NarrativeRole::Rival, "Runs the rival ferry", now),
            Character::minimal("Eli", NarrativeRole::Mentor, "Harbor master", now),
        ];
        serde_json::json!({
            "characters": characters,
            "relationships": [Relationship::new("Mara", "Jonah", "rival")],
        })
        .to_string()
    }

    #[test]
    fn graph_round_trip() {
        let engine = StoryEngine::new(1);
        let out = engine.build_graph_json(&cast_json()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["edges"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["edges"][0]["category"], "rival");
    }

    #[test]
    fn bad_cast_json_is_reported() {
        let engine = StoryEngine::new(1);
        let err = engine.build_graph_json("{").unwrap_err();
        assert!(err.starts_with("Invalid cast JSON"));
    }

    #[test]
    fn locations_priced() {
        let engine = StoryEngine::new(1);
        let input = r#"[{"name": "Dock 4", "sourcing": "peerspace", "venue_type": "Warehouse"}]"#;
        let out = engine.estimate_locations_json(input).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["estimated_cost"], 358.0);
        assert_eq!(value[0]["is_estimated"], true);
    }

    #[test]
    fn elaborate_one_tier() {
        let engine = StoryEngine::new(9);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let character = Character::minimal("Mara", NarrativeRole::Protagonist, "A ferry pilot", now);
        let input = serde_json::json!({ "character": character, "now": now }).to_string();
        let out = engine.elaborate_json(&input).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["character"]["tier"], "balanced");
        assert!(value["error"].is_null());
    }

    #[test]
    fn stateless_helpers() {
        assert_eq!(layout_position(0, 0), vec![50.0, 50.0]);
        assert!(is_placeholder(" TBD "));
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let blank = Character::minimal("X", NarrativeRole::Ensemble, "unknown", now);
        let out = collapsed_sections_json(&serde_json::to_string(&blank).unwrap()).unwrap();
        assert_eq!(out, r#"["basic"]"#);
    }
}
