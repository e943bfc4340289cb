/// Circular layout — deterministic node positions on a percent canvas.
///
/// The anchor sits at the center; every other node goes on a ring starting
/// at the top and proceeding clockwise.
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A point on the canvas, each axis in percent (0–100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const CENTER: Position = Position { x: 50.0, y: 50.0 };
}

/// A node and where it goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl PositionedNode {
    pub fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }
}

/// Ring radius parameters, in percent of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub base_radius: f64,
    /// Added per ring node beyond `crowding_threshold`.
    pub growth_per_node: f64,
    pub crowding_threshold: usize,
    pub max_radius: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_radius: 35.0,
            growth_per_node: 3.0,
            crowding_threshold: 6,
            max_radius: 45.0,
        }
    }
}

/// Pure, stateless circular layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CircularLayout {
    pub config: LayoutConfig,
}

impl CircularLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Ring radius for `total` ring nodes.
    pub fn radius(&self, total: usize) -> f64 {
        let extra = total.saturating_sub(self.config.crowding_threshold) as f64;
        (self.config.base_radius + extra * self.config.growth_per_node)
            .min(self.config.max_radius)
    }

    /// Position of ring node `index` out of `total` ring nodes.
    ///
    /// `total == 0` yields the center.
    pub fn position(&self, index: usize, total: usize) -> Position {
        if total == 0 {
            return Position::CENTER;
        }
        let angle = -PI / 2.0 + 2.0 * PI * index as f64 / total as f64;
        let radius = self.radius(total);
        Position {
            x: Position::CENTER.x + radius * angle.cos(),
            y: Position::CENTER.y + radius * angle.sin(),
        }
    }

    /// Lay out `ids` with the first one as the anchor.
    pub fn layout<S: AsRef<str>>(&self, ids: &[S]) -> Vec<PositionedNode> {
        let ring_total = ids.len().saturating_sub(1);
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                let position = match i {
                    0 => Position::CENTER,
                    _ => self.position(i - 1, ring_total),
                };
                PositionedNode {
                    id: id.as_ref().to_string(),
                    x: position.x,
                    y: position.y,
                }
            })
            .collect()
    }
}
