//! Observability infrastructure for the render service.
//!
//! This crate provides:
//! - `LogLevel` / `LogFormat` - Parsed logging options
//! - `init_logging` - Install the process-wide `tracing` subscriber
//! - `RequestId` / `request_span` - Per-request correlation

mod logging;
mod span;

pub use logging::*;
pub use span::*;
