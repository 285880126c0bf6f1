//! Request handlers.

pub mod cleanup;
pub mod download;
pub mod health;
pub mod render;
pub mod scrape;
pub mod uploads;

pub use cleanup::*;
pub use download::*;
pub use health::*;
pub use render::*;
pub use scrape::*;
pub use uploads::*;
