/// Relationship classifier — maps free-text relationship descriptions to
/// a category and an edge style.
///
/// Rules are an ordered list evaluated top to bottom; the first rule with a
/// keyword contained in the normalized text wins. A keyword written with a
/// leading space (`" ally"`) only matches at the start of a word.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("style rule for {0:?} has no keywords")]
    EmptyRule(RelationshipCategory),
}

/// Canonical relationship categories, in default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipCategory {
    Ally,
    Rival,
    Family,
    Romantic,
    Mentor,
    Professional,
    Complex,
    Unclassified,
}

/// Visual style of a graph edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub color: String,
    pub stroke_width: f32,
    #[serde(default)]
    pub stroke_dasharray: Option<String>,
    pub opacity: f32,
    /// Set for complex relationships once both endpoints are known.
    /// Whether a renderer draws an actual gradient is its own business.
    #[serde(default)]
    pub gradient_id: Option<String>,
}

impl EdgeStyle {
    pub fn solid(color: &str, stroke_width: f32, opacity: f32) -> Self {
        Self {
            color: color.to_string(),
            stroke_width,
            stroke_dasharray: None,
            opacity,
            gradient_id: None,
        }
    }

    pub fn dashed(mut self, pattern: &str) -> Self {
        self.stroke_dasharray = Some(pattern.to_string());
        self
    }

    /// Faint style for pairs with no authored relationship.
    pub fn latent() -> Self {
        Self::solid(GRAY_LIGHT, 1.0, 0.15)
    }
}

pub const GREEN: &str = "#10b981";
pub const RED: &str = "#ef4444";
pub const AMBER: &str = "#f59e0b";
pub const PINK: &str = "#ec4899";
pub const BLUE: &str = "#3b82f6";
pub const GRAY: &str = "#6b7280";
pub const GRAY_LIGHT: &str = "#9ca3af";

/// One row of the classification table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub category: RelationshipCategory,
    pub keywords: Vec<String>,
    pub style: EdgeStyle,
}

impl StyleRule {
    fn new(category: RelationshipCategory, keywords: &[&str], style: EdgeStyle) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            style,
        }
    }

    fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalized.contains(k.as_str()))
    }
}

/// Result of classifying one relationship description.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: RelationshipCategory,
    pub style: EdgeStyle,
}

/// A keyword that can never decide a classification because an earlier
/// rule's keyword is contained in it.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowedKeyword {
    pub category: RelationshipCategory,
    pub keyword: String,
    pub shadowed_by: RelationshipCategory,
    pub shadowing_keyword: String,
}

/// Ordered keyword table plus a fallback style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipClassifier {
    pub rules: Vec<StyleRule>,
    pub fallback: EdgeStyle,
}

impl Default for RelationshipClassifier {
    fn default() -> Self {
        use RelationshipCategory::*;
        Self {
            rules: vec![
                StyleRule::new(
                    Ally,
                    &[" ally", "friend", "companion", "confidant", "supporter", "loyal"],
                    EdgeStyle::solid(GREEN, 3.0, 0.6),
                ),
                StyleRule::new(
                    Rival,
                    &[
                        "rival",
                        "enemy",
                        "antagonist",
                        "nemesis",
                        "adversary",
                        "opponent",
                        "foe",
                        "hostile",
                    ],
                    EdgeStyle::solid(RED, 3.0, 0.7).dashed("8,4"),
                ),
                StyleRule::new(
                    Family,
                    &[
                        "family", "sibling", "brother", "sister", "parent", "mother", "father",
                        "daughter", "cousin", "uncle", " aunt", "grand",
                    ],
                    EdgeStyle::solid(AMBER, 4.0, 0.8),
                ),
                StyleRule::new(
                    Romantic,
                    &[
                        "love", "romantic", "romance", "lover", "crush", "spouse", "husband",
                        "wife", "life partner", "domestic partner", "dating",
                    ],
                    EdgeStyle::solid(PINK, 3.0, 0.7),
                ),
                StyleRule::new(
                    Mentor,
                    &[
                        "mentor", "student", "teacher", "apprentice", "protege", "protégé",
                        "pupil", "guide",
                    ],
                    EdgeStyle::solid(BLUE, 3.0, 0.6),
                ),
                StyleRule::new(
                    Professional,
                    &[
                        "colleague", "coworker", "co-worker", "professional", "boss", "employee",
                        "employer", "business", "partner",
                    ],
                    EdgeStyle::solid(GRAY, 2.0, 0.5),
                ),
                StyleRule::new(
                    Complex,
                    &["complex", "complicated", "mixed", "ambivalent", "conflicted"],
                    EdgeStyle::solid(GREEN, 3.0, 0.7),
                ),
            ],
            fallback: EdgeStyle::solid(GREEN, 3.0, 0.6),
        }
    }
}

impl RelationshipClassifier {
    /// Load a classification table from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Self, StyleError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a classification table from a RON string.
    pub fn parse_ron(input: &str) -> Result<Self, StyleError> {
        let classifier: RelationshipClassifier = ron::from_str(input)?;
        if let Some(rule) = classifier.rules.iter().find(|r| r.keywords.is_empty()) {
            return Err(StyleError::EmptyRule(rule.category));
        }
        Ok(classifier)
    }

    /// Classify a relationship description. Never fails: unmatched text
    /// gets the fallback style.
    pub fn classify(&self, relationship_type: &str) -> Classification {
        let normalized = normalize(relationship_type);
        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| Classification {
                category: rule.category,
                style: rule.style.clone(),
            })
            .unwrap_or_else(|| Classification {
                category: RelationshipCategory::Unclassified,
                style: self.fallback.clone(),
            })
    }

    /// Keywords that lose to an earlier rule on every input containing them.
    pub fn shadowed_keywords(&self) -> Vec<ShadowedKeyword> {
        let mut shadowed = Vec::new();
        for (i, rule) in self.rules.iter().enumerate() {
            for keyword in &rule.keywords {
                let keyword_lower = format!(" {}", keyword.to_lowercase());
                let winner = self.rules[..i].iter().find_map(|earlier| {
                    earlier
                        .keywords
                        .iter()
                        .find(|k| keyword_lower.contains(k.to_lowercase().as_str()))
                        .map(|k| (earlier.category, k.clone()))
                });
                if let Some((shadowed_by, shadowing_keyword)) = winner {
                    shadowed.push(ShadowedKeyword {
                        category: rule.category,
                        keyword: keyword.clone(),
                        shadowed_by,
                        shadowing_keyword,
                    });
                }
            }
        }
        shadowed
    }
}

/// Lowercased text with a leading space, punctuation other than `-` and `'`
/// turned into spaces, so every word starts after a space.
fn normalize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len() + 1);
    normalized.push(' ');
    for c in text.trim().to_lowercase().chars() {
        if c.is_alphanumeric() || c == '-' || c == '\'' {
            normalized.push(c);
        } else {
            normalized.push(' ');
        }
    }
    normalized
}

/// Stable gradient key for the edge between two named characters.
///
/// `gradient_id("Mara Quell", "Jonah")` is `"gradient-mara-quell-jonah"`.
/// Unique as long as names are unique within one graph.
pub fn gradient_id(a: &str, b: &str) -> String {
    let joined = format!("gradient-{a}-{b}");
    joined
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
