//! Gemini API integration.
//!
//! Implements the SolarGateway trait over the Gemini REST API: text steps
//! go through `generateContent` (the bill of materials with a structured
//! response schema), renderings through the Imagen `predict` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::credentials::{ApiKey, CredentialResolver};
use super::{prompts, GatewayError, Rendering, SolarGateway};
use crate::core::{parse_bom_json, AiConfig, BomItem, SitePhoto, SystemRequirements};

/// Gemini-backed gateway.
pub struct GeminiClient {
    client: Client,
    credentials: CredentialResolver,
    text_model: String,
    image_model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            client: Client::new(),
            credentials: CredentialResolver::new(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve the key for this call. Resolution is not cached, so a key
    /// added or removed mid-session takes effect on the next call.
    fn api_key(&self) -> Result<ApiKey, GatewayError> {
        self.credentials.resolve().ok_or(GatewayError::Configuration)
    }

    /// POST a generateContent request and return the candidate text.
    async fn generate_text(
        &self,
        prompt: String,
        generation_config: Option<GenerationConfig>,
    ) -> Result<String, GatewayError> {
        let key = self.api_key()?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.text_model);
        let request = GenerateContentRequest {
            contents: vec![RequestContent { parts: vec![RequestPart { text: prompt }] }],
            generation_config,
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Provider(format!("API error ({status}): {body}")));
        }

        let payload: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::debug!(error = %e, "Unparseable generateContent payload");
            GatewayError::Format
        })?;

        extract_text(payload).ok_or(GatewayError::Format)
    }

    /// POST an Imagen predict request and return the generated images.
    async fn generate_images(&self, prompt: String) -> Result<Vec<Rendering>, GatewayError> {
        let key = self.api_key()?;
        let url = format!("{}/models/{}:predict", self.base_url, self.image_model);
        let request = PredictRequest {
            instances: vec![ImageInstance { prompt }],
            parameters: ImageParameters {
                sample_count: 1,
                aspect_ratio: "16:9".to_string(),
                output_mime_type: "image/jpeg".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Provider(format!("API error ({status}): {body}")));
        }

        let payload: PredictResponse = response.json().await.map_err(|e| {
            tracing::debug!(error = %e, "Unparseable predict payload");
            GatewayError::Format
        })?;

        let renderings = collect_renderings(payload);
        if renderings.is_empty() {
            return Err(GatewayError::Format);
        }
        Ok(renderings)
    }
}

#[async_trait]
impl SolarGateway for GeminiClient {
    async fn analyze_components(
        &self,
        requirements: &SystemRequirements,
    ) -> Result<String, GatewayError> {
        self.generate_text(prompts::analysis(requirements), None).await
    }

    async fn render_previews(
        &self,
        components: &str,
        photos: &[SitePhoto],
    ) -> Result<Vec<Rendering>, GatewayError> {
        if photos.is_empty() {
            return Err(GatewayError::Input(
                "At least one site photo is required to generate renderings.".to_string(),
            ));
        }
        self.generate_images(prompts::renderings(components, photos.len())).await
    }

    async fn build_bill_of_materials(
        &self,
        components: &str,
        _photos: &[SitePhoto],
    ) -> Result<Vec<BomItem>, GatewayError> {
        let text = self
            .generate_text(prompts::bill_of_materials(components), Some(bom_generation_config()))
            .await?;

        parse_bom_json(text.trim()).map_err(|e| {
            tracing::debug!(error = %e, "Bill of materials response failed validation");
            GatewayError::Format
        })
    }

    async fn compile_order_sheet(&self, items: &[BomItem]) -> Result<String, GatewayError> {
        self.generate_text(prompts::order_sheet(items), None).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Structured-output settings for the bill-of-materials call.
fn bom_generation_config() -> GenerationConfig {
    GenerationConfig {
        response_mime_type: "application/json".to_string(),
        response_schema: bom_response_schema(),
    }
}

/// The fixed response schema: a JSON array of material items, all fields
/// required.
fn bom_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "item": { "type": "STRING" },
                "quantity": { "type": "INTEGER" },
                "description": { "type": "STRING" },
                "vendor": { "type": "STRING", "description": "A suggested vendor or manufacturer" }
            },
            "required": ["item", "quantity", "description", "vendor"]
        }
    })
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let parts = response.candidates.into_iter().next()?.content?.parts;
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn collect_renderings(response: PredictResponse) -> Vec<Rendering> {
    response
        .predictions
        .into_iter()
        .filter_map(|p| {
            p.bytes_base64_encoded.map(|base64| Rendering {
                mime_type: p.mime_type.unwrap_or_else(|| "image/jpeg".to_string()),
                base64,
            })
        })
        .collect()
}

/// generateContent request structure.
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,

    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

/// generateContent response structure.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Imagen predict request structure.
#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<ImageInstance>,
    parameters: ImageParameters,
}

#[derive(Debug, Serialize)]
struct ImageInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_mime_type: String,
}

/// Imagen predict response structure.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}
