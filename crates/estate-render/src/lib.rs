//! Composition rendering for listing videos and carousels.
//!
//! This crate provides:
//! - Parameter records for the reel, carousel and sold compositions
//! - A render CLI command builder and runner with a bounded wait
//! - Carousel archiving and render orchestration

pub mod archive;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod props;
pub mod service;

pub use command::{check_render_tool, CompositionRenderer, RenderCommand, RenderMode, RenderRunner};
pub use config::RendererConfig;
pub use error::{RenderError, RenderResult};
pub use logging::RenderLogger;
pub use props::{build_carousel, build_reel, build_sold, render_jobs, RenderJob};
pub use service::{RenderOutput, RenderService};
