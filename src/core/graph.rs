/// Relationship graph builder — positioned nodes plus one styled edge for
/// every unordered pair of entities.
///
/// Pairs with an authored relationship get the classifier's style; all
/// other pairs get a faint latent edge so the full topology stays visible.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::classifier::{
    gradient_id, EdgeStyle, RelationshipCategory, RelationshipClassifier,
};
use crate::core::layout::{CircularLayout, Position, PositionedNode};
use crate::schema::character::Character;
use crate::schema::relationship::{find_relationship, Relationship};

/// Anything that can be placed on the relationship graph.
pub trait GraphEntity {
    /// Stable id used for nodes and edge endpoints.
    fn graph_id(&self) -> String;
    /// Name used to match relationship records.
    fn graph_name(&self) -> &str;
}

impl GraphEntity for Character {
    fn graph_id(&self) -> String {
        self.id.0.to_string()
    }

    fn graph_name(&self) -> &str {
        &self.name
    }
}

/// A renderable edge between two positioned nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledEdge {
    pub from_id: String,
    pub to_id: String,
    pub from: Position,
    pub to: Position,
    /// `None` for latent edges.
    pub category: Option<RelationshipCategory>,
    pub relationship_type: Option<String>,
    pub style: EdgeStyle,
}

impl StyledEdge {
    pub fn is_latent(&self) -> bool {
        self.category.is_none()
    }
}

/// Nodes and edges ready for a renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<StyledEdge>,
}

impl RelationshipGraph {
    pub fn authored_edges(&self) -> impl Iterator<Item = &StyledEdge> {
        self.edges.iter().filter(|e| !e.is_latent())
    }

    pub fn latent_edges(&self) -> impl Iterator<Item = &StyledEdge> {
        self.edges.iter().filter(|e| e.is_latent())
    }
}

/// A relationship record that lost to an earlier record for the same pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicatePair {
    /// Index of the record that is used.
    pub kept: usize,
    /// Index of the record that is ignored.
    pub ignored: usize,
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Records describing a pair that an earlier record already describes.
pub fn duplicate_pairs(relationships: &[Relationship]) -> Vec<DuplicatePair> {
    let mut first: FxHashMap<(String, String), usize> = FxHashMap::default();
    let mut duplicates = Vec::new();
    for (i, rel) in relationships.iter().enumerate() {
        let key = pair_key(&rel.character_a, &rel.character_b);
        match first.get(&key) {
            Some(&kept) => duplicates.push(DuplicatePair { kept, ignored: i }),
            None => {
                first.insert(key, i);
            }
        }
    }
    duplicates
}

/// Combines the classifier and the layout into a full graph.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    pub classifier: RelationshipClassifier,
    pub layout: CircularLayout,
    pub latent_style: Option<EdgeStyle>,
}

impl GraphBuilder {
    pub fn new(classifier: RelationshipClassifier, layout: CircularLayout) -> Self {
        Self {
            classifier,
            layout,
            latent_style: None,
        }
    }

    pub fn with_latent_style(mut self, style: EdgeStyle) -> Self {
        self.latent_style = Some(style);
        self
    }

    /// Build the graph. `entities[0]` is the anchor.
    ///
    /// Produces exactly `n * (n - 1) / 2` edges, in `(i, j)` order with
    /// `i < j`. When several records describe the same pair the first one
    /// wins.
    pub fn build<E: GraphEntity>(
        &self,
        entities: &[E],
        relationships: &[Relationship],
    ) -> RelationshipGraph {
        if entities.is_empty() {
            return RelationshipGraph::default();
        }

        let ids: Vec<String> = entities.iter().map(|e| e.graph_id()).collect();
        let nodes = self.layout.layout(ids.as_slice());

        for dup in duplicate_pairs(relationships) {
            let rel = &relationships[dup.ignored];
            tracing::warn!(
                "Ignoring duplicate relationship record {} between '{}' and '{}' (record {} wins)",
                dup.ignored,
                rel.character_a,
                rel.character_b,
                dup.kept
            );
        }

        let latent = self.latent_style.clone().unwrap_or_else(EdgeStyle::latent);
        let n = entities.len();
        let mut edges = Vec::with_capacity(n * (n - 1) / 2);

        for i in 0..n {
            for j in (i + 1)..n {
                let name_a = entities[i].graph_name();
                let name_b = entities[j].graph_name();
                let authored = find_relationship(relationships, name_a, name_b);

                let (category, relationship_type, style) = match authored {
                    Some(rel) => {
                        let classification = self.classifier.classify(&rel.relationship_type);
                        let mut style = classification.style;
                        if classification.category == RelationshipCategory::Complex {
                            style.gradient_id = Some(gradient_id(name_a, name_b));
                        }
                        (
                            Some(classification.category),
                            Some(rel.relationship_type.clone()),
                            style,
                        )
                    }
                    None => (None, None, latent.clone()),
                };

                edges.push(StyledEdge {
                    from_id: ids[i].clone(),
                    to_id: ids[j].clone(),
                    from: nodes[i].position(),
                    to: nodes[j].position(),
                    category,
                    relationship_type,
                    style,
                });
            }
        }

        tracing::debug!(
            "Built relationship graph: {} nodes, {} edges",
            nodes.len(),
            edges.len()
        );

        RelationshipGraph { nodes, edges }
    }
}
