/// Cast sheets — the hand-authored list of characters and relationships a
/// story starts from.
use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::character::{Character, NarrativeRole};
use super::relationship::Relationship;

#[derive(Debug, Error)]
pub enum CastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("cast member name '{0}' is used more than once")]
    DuplicateName(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub role: NarrativeRole,
    pub description: String,
    #[serde(default)]
    pub archetype: Option<String>,
}

/// Members in display order (the first one anchors the graph) plus the
/// relationships between them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CastSheet {
    pub members: Vec<CastMember>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl CastSheet {
    /// Load a cast sheet from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Self, CastError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a cast sheet from a RON string.
    ///
    /// Names must be unique: relationships refer to members by name.
    pub fn parse_ron(input: &str) -> Result<Self, CastError> {
        let sheet: CastSheet = ron::from_str(input)?;
        let mut seen = FxHashSet::default();
        for member in &sheet.members {
            if !seen.insert(member.name.as_str()) {
                return Err(CastError::DuplicateName(member.name.clone()));
            }
        }
        Ok(sheet)
    }

    /// One minimal-tier character per member, in sheet order.
    pub fn characters(&self, now: DateTime<Utc>) -> Vec<Character> {
        self.members
            .iter()
            .map(|member| {
                let mut character =
                    Character::minimal(&member.name, member.role, &member.description, now);
                character.basic.archetype = member.archetype.clone();
                character
            })
            .collect()
    }
}
