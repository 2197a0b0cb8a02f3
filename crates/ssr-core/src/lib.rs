//! Core abstractions for server-side rendering of entry components.
//!
//! This crate provides the framework seam the render service drives:
//! - `Component` - Render-capable UI component trait
//! - `TemplateComponent` - Built-in component backed by a markup template
//! - `SsrApp` - Application descriptor (root component + configure hook)
//! - `AppInstance` - Fresh per-render application state
//! - `render` / `render_to_stream` - Streaming server renderer

mod app;
mod component;
mod props;
mod renderer;
mod template;

pub use app::*;
pub use component::*;
pub use props::*;
pub use renderer::*;
pub use template::*;
