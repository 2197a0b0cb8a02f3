//! HTTP front ends for the render service.
//!
//! This crate provides:
//! - `router` - `POST /render` backed by a resolved manifest
//! - `start` / `serve` - Bind over TCP or a unix socket and hand back a `ServerHandle`
//! - `DevMiddleware` - Development render hook that re-imports entries per request

mod body;
mod dev;
mod error;
mod request;
mod routes;
mod server;

pub use body::stream_body;
pub use dev::*;
pub use error::*;
pub use request::*;
pub use routes::*;
pub use server::*;
