//! AI gateway module.
//!
//! The four generation operations the planner delegates to the Gemini API:
//! component analysis, installation renderings, bill of materials, and the
//! order sheet. The gateway is a trait so the workflow engine can be driven
//! against a scripted implementation in tests.

mod credentials;
mod gemini;
mod prompts;

pub use credentials::{ApiKey, CredentialError, CredentialResolver, ENV_VAR};
pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::core::{BomItem, SitePhoto, SystemRequirements};

/// One generated rendering image.
#[derive(Debug, Clone)]
pub struct Rendering {
    pub mime_type: String,
    pub base64: String,
}

impl Rendering {
    /// Approximate decoded size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.base64.len() / 4 * 3
    }

    /// File extension matching the MIME type, for export.
    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }

    /// Decode the image bytes for writing to disk.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.decode(&self.base64)
    }
}

/// Gateway failure kinds.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No usable API key is configured.
    #[error("no API key is configured; run `solarplan key set` or set GEMINI_API_KEY")]
    Configuration,

    /// A precondition on the call's inputs was violated.
    #[error("{0}")]
    Input(String),

    /// The upstream service failed; the message passes through as-is.
    #[error("{0}")]
    Provider(String),

    /// The response did not match the expected shape. The raw cause is
    /// logged, not surfaced.
    #[error("the AI returned data in an unexpected format")]
    Format,
}

/// Request/response contract to the external generation service.
#[async_trait]
pub trait SolarGateway: Send + Sync {
    /// Produce a compatible-component list for the given requirements.
    async fn analyze_components(
        &self,
        requirements: &SystemRequirements,
    ) -> Result<String, GatewayError>;

    /// Generate installation renderings. Requires at least one site photo.
    async fn render_previews(
        &self,
        components: &str,
        photos: &[SitePhoto],
    ) -> Result<Vec<Rendering>, GatewayError>;

    /// Build an itemized bill of materials conforming to the BomItem schema.
    async fn build_bill_of_materials(
        &self,
        components: &str,
        photos: &[SitePhoto],
    ) -> Result<Vec<BomItem>, GatewayError>;

    /// Compile the purchase-order text from the bill of materials.
    async fn compile_order_sheet(&self, items: &[BomItem]) -> Result<String, GatewayError>;

    /// Provider name shown in the status header.
    fn name(&self) -> &str;
}
