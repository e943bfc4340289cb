//! Value types exchanged with callers: characters, relationships, cast
//! sheets and location suggestions.

pub mod cast;
pub mod character;
pub mod location;
pub mod relationship;
