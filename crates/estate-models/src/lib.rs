//! Shared data models for the listing render backend.
//!
//! This crate provides Serde-serializable types for:
//! - Listing records and photo references
//! - Effects configuration and the free-text effects parser
//! - Render requests, templates and brand configuration
//! - Render and session identifiers

pub mod effects;
pub mod id;
pub mod listing;
pub mod render;

// Re-export common types
pub use effects::{parse_effects_description, EffectValueError, EffectsConfig, EffectsInput, Overlay, Tempo, TextPosition, Transition};
pub use id::{RenderId, SessionId};
pub use listing::{ListingRecord, PhotoRef};
pub use render::{BrandConfig, PhotoInput, RenderRequest, Template, TemplateParseError};
