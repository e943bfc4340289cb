//! Story Engine — character, relationship and location modeling for story
//! production tools.
//!
//! Characters move through complexity tiers (minimal, balanced, detailed)
//! with synthesized content, relationships are classified and laid out as a
//! complete graph for rendering, and location suggestions get day-rate
//! estimates when they arrive without a usable price.

pub mod core;
pub mod schema;
