//! Streaming primitives for delivering rendered markup.
//!
//! - `Utf8Decoder` - Incremental decoder that carries split sequences
//! - `relay` - Drain a byte stream into a text sink, one write per read
//! - `collect` - Accumulate a byte stream into a single string
//! - `writer_sink` - Adapt an async writer (stdout, sockets) into a sink

mod decoder;
mod relay;

pub use decoder::*;
pub use relay::*;
