//! Render request body.

use serde::Deserialize;
use serde_json::Value;
use ssr_core::Props;

/// Body of a render request.
///
/// `context` is accepted as an alias of `props`.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    /// Entry name or source key to render.
    #[serde(rename = "entryName")]
    pub entry_name: String,

    /// Input properties for the root component.
    #[serde(alias = "context")]
    pub props: Props,
}

impl RenderRequest {
    /// Parse a request from raw body bytes.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Validate an already parsed JSON document.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
