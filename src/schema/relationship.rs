use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// An authored relationship between two characters, identified by name.
///
/// The pair is unordered: `connects("A", "B")` and `connects("B", "A")`
/// are the same question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub character_a: String,
    pub character_b: String,
    /// Free-text description, e.g. "childhood friend" or "bitter rival".
    pub relationship_type: String,
    #[serde(default)]
    pub significance: Option<String>,
    #[serde(default)]
    pub tags: FxHashSet<String>,
}

impl Relationship {
    pub fn new(
        character_a: impl Into<String>,
        character_b: impl Into<String>,
        relationship_type: impl Into<String>,
    ) -> Self {
        Self {
            character_a: character_a.into(),
            character_b: character_b.into(),
            relationship_type: relationship_type.into(),
            significance: None,
            tags: FxHashSet::default(),
        }
    }

    /// Returns true if this record links `a` and `b`, in either order.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.character_a == a && self.character_b == b)
            || (self.character_a == b && self.character_b == a)
    }
}

/// Find the relationship linking `a` and `b`.
///
/// When several records describe the same pair, the first one in `records`
/// wins.
pub fn find_relationship<'a>(
    records: &'a [Relationship],
    a: &str,
    b: &str,
) -> Option<&'a Relationship> {
    records.iter().find(|rel| rel.connects(a, b))
}
