//! Entry resolution for the render service.
//!
//! This crate turns build output into render-ready applications:
//! - `ModuleImporter` - Pluggable module loading strategy
//! - `FsImporter` / `ModuleRegistry` - Filesystem and in-process importers
//! - `EntryLoader` - Import a module and validate its `ssrApp` export
//! - `Manifest` - Eagerly resolved name/source-key table of entries

mod entry;
mod error;
mod importer;
mod manifest;
mod module;

pub use entry::*;
pub use error::*;
pub use importer::*;
pub use manifest::*;
pub use module::*;
