//! Business logic services.

pub mod sessions;

pub use sessions::{SessionStore, UPLOADS_PREFIX};
