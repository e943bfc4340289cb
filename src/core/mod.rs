/// Engines over the schema types: emptiness rules, tier transitions,
/// relationship classification and layout, location pricing.
pub mod classifier;
pub mod emptiness;
pub mod graph;
pub mod layout;
pub mod pricing;
pub mod synthesis;
pub mod tiers;
