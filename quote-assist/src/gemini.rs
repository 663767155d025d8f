use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use quote_core::models::{Quotation, Settings};

use crate::draft::DraftQuotation;
use crate::local::{self, LocalAssistant};
use crate::Assistant;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const FLASH_MODEL: &str = "gemini-3-flash-preview";
const PRO_MODEL: &str = "gemini-3-pro-preview";

#[derive(Debug, Error)]
enum GeminiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("response carried no text")]
    EmptyResponse,

    #[error("response did not match the expected shape: {0}")]
    BadShape(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Remote assistant backed by the Gemini `generateContent` API.
///
/// Holds a [`LocalAssistant`] internally; any failed call answers with the
/// local result instead, so callers never observe an error.
pub struct GeminiAssistant {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    fallback: LocalAssistant,
}

impl GeminiAssistant {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Base URL override, used by tests to point at a mock server.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            fallback: LocalAssistant,
        }
    }

    async fn generate(
        &self,
        model: &str,
        body: serde_json::Value,
    ) -> Result<String, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Status { status, body });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GeminiError::EmptyResponse);
        }
        Ok(text.trim().to_string())
    }

    fn image_part(image: &[u8], mime: &str) -> serde_json::Value {
        json!({
            "inline_data": {
                "mime_type": mime,
                "data": BASE64.encode(image),
            }
        })
    }

    async fn try_text_from_image(&self, image: &[u8], mime: &str) -> Result<String, GeminiError> {
        let body = json!({
            "contents": [{ "parts": [
                Self::image_part(image, mime),
                { "text": "Extract all handwritten or printed text from this tiling job note. \
                           Return only the extracted text." }
            ]}]
        });
        self.generate(FLASH_MODEL, body).await
    }

    async fn try_assess_site(&self, image: &[u8], mime: &str) -> Result<String, GeminiError> {
        let body = json!({
            "contents": [{ "parts": [
                Self::image_part(image, mime),
                { "text": "Act as a senior tiler. Analyze this site photo. List any potential \
                           issues (uneven floors, cracks, damp) and suggested prep materials." }
            ]}]
        });
        self.generate(FLASH_MODEL, body).await
    }

    /// Response schema for structured drafts. Mirrors [`DraftQuotation`];
    /// the API rejects responses that stray from it, and anything that
    /// still slips through fails the strict parse and falls back.
    fn draft_schema() -> serde_json::Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "client_details": {
                    "type": "OBJECT",
                    "properties": {
                        "client_name": { "type": "STRING" },
                        "client_address": { "type": "STRING" },
                        "client_phone": { "type": "STRING" },
                        "project_name": { "type": "STRING" },
                    },
                },
                "tiles": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "category": { "type": "STRING" },
                            "group": { "type": "STRING" },
                            "cartons": { "type": "NUMBER" },
                            "sqm": { "type": "NUMBER" },
                            "size": { "type": "STRING" },
                            "tile_type": { "type": "STRING" },
                            "unit_price": { "type": "NUMBER" },
                        },
                        "required": ["category", "cartons", "sqm", "unit_price"],
                    },
                },
                "materials": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "item": { "type": "STRING" },
                            "quantity": { "type": "NUMBER" },
                            "unit": { "type": "STRING" },
                            "unit_price": { "type": "NUMBER" },
                            "calculation_note": { "type": "STRING" },
                        },
                        "required": ["item", "quantity", "unit", "unit_price"],
                    },
                },
                "adjustments": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "description": { "type": "STRING" },
                            "amount": { "type": "NUMBER" },
                        },
                        "required": ["description", "amount"],
                    },
                },
                "checklist": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "item": { "type": "STRING" },
                            "checked": { "type": "BOOLEAN" },
                        },
                        "required": ["item", "checked"],
                    },
                },
                "workmanship_rate": { "type": "NUMBER" },
                "maintenance": { "type": "NUMBER" },
                "profit_percentage": { "type": "NUMBER" },
                "deposit_percentage": { "type": "NUMBER" },
                "terms_and_conditions": { "type": "STRING" },
                "pro_tips": { "type": "ARRAY", "items": { "type": "STRING" } },
            },
            "required": ["client_details", "tiles", "materials", "checklist"],
        })
    }

    async fn try_draft(
        &self,
        notes: &str,
        settings: &Settings,
    ) -> Result<DraftQuotation, GeminiError> {
        let size_rules: Vec<String> = settings
            .pricing
            .size_prices
            .iter()
            .map(|rule| format!("size \"{}\" -> {}", rule.size, rule.price))
            .collect();
        let prompt = format!(
            "You are a tiling quotation formatter and calculator. Convert the job notes into a \
             quotation JSON object with keys: client_details, tiles, materials, adjustments, \
             checklist, workmanship_rate, maintenance, profit_percentage, deposit_percentage, \
             terms_and_conditions, pro_tips.\n\
             Notes: {notes}\n\
             Pricing rules: {rules}. Default workmanship rate: {rate} per m2.\n\
             Suggest cement, grout and adhesive quantities from the total area, using units from \
             [{units}], and state in each material's calculation_note how the quantity was \
             derived. Add two or three project-specific pro tips.",
            rules = size_rules.join("; "),
            rate = settings.pricing.workmanship_rate,
            units = settings.material_units.join(", "),
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": Self::draft_schema(),
            }
        });
        let text = self.generate(PRO_MODEL, body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn try_refine(
        &self,
        quotation: &Quotation,
        instruction: &str,
    ) -> Result<Quotation, GeminiError> {
        let prompt = format!(
            "Update this tiling quotation JSON per the instruction, keeping the structure \
             identical and every unmentioned field unchanged.\n\
             Instruction: {instruction}\n\
             Current JSON: {current}",
            current = serde_json::to_string(quotation)?,
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });
        let text = self.generate(PRO_MODEL, body).await?;
        let mut revised: Quotation = serde_json::from_str(&text)?;
        // The id and issue date are ours to manage, whatever came back.
        revised.id = quotation.id.clone();
        revised.date = quotation.date;
        Ok(revised)
    }
}

#[async_trait]
impl Assistant for GeminiAssistant {
    async fn text_from_image(&self, image: &[u8], mime: &str) -> String {
        match self.try_text_from_image(image, mime).await {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "image text extraction failed; using local substitute");
                self.fallback.text_from_image(image, mime).await
            }
        }
    }

    async fn assess_site(&self, image: &[u8], mime: &str) -> String {
        match self.try_assess_site(image, mime).await {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "site assessment failed; using local substitute");
                self.fallback.assess_site(image, mime).await
            }
        }
    }

    async fn draft_quotation(&self, notes: &str, settings: &Settings) -> DraftQuotation {
        match self.try_draft(notes, settings).await {
            Ok(draft) => draft,
            Err(error) => {
                warn!(%error, "remote draft failed; using local draft");
                local::build_draft(notes, settings)
            }
        }
    }

    async fn refine_quotation(&self, quotation: &Quotation, instruction: &str) -> Quotation {
        match self.try_refine(quotation, instruction).await {
            Ok(revised) => revised,
            Err(error) => {
                warn!(%error, "refinement failed; keeping the quotation as-is");
                quotation.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn gemini_reply(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }

    #[tokio::test]
    async fn draft_parses_the_returned_json() {
        let server = MockServer::start().await;
        let draft_json = r#"{
            "client_details": { "client_name": "Mrs. Adeyemi", "project_name": "Duplex" },
            "tiles": [{ "category": "Floor Tiles", "cartons": 40, "sqm": 60,
                        "tile_type": "Floor", "unit_price": 6500 }],
            "materials": [],
            "workmanship_rate": 1500,
            "profit_percentage": 12,
            "pro_tips": ["Use levelling clips"]
        }"#;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{PRO_MODEL}:generateContent")))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(draft_json)))
            .mount(&server)
            .await;
        let assistant = GeminiAssistant::with_base_url("key", server.uri());

        let draft = assistant
            .draft_quotation("60m2 duplex floor", &Settings::default())
            .await;

        assert_eq!(draft.client_details.client_name, "Mrs. Adeyemi");
        assert_eq!(draft.tiles[0].cartons, dec!(40));
        assert_eq!(draft.profit_percentage, Some(dec!(12)));
    }

    #[tokio::test]
    async fn malformed_draft_falls_back_to_the_local_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("not json at all")))
            .mount(&server)
            .await;
        let assistant = GeminiAssistant::with_base_url("key", server.uri());
        let settings = Settings::default();

        let draft = assistant.draft_quotation("60m2 floor", &settings).await;

        assert_eq!(draft, local::build_draft("60m2 floor", &settings));
    }

    #[tokio::test]
    async fn server_error_falls_back_to_the_local_substitutes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let assistant = GeminiAssistant::with_base_url("key", server.uri());

        let text = assistant.text_from_image(b"bytes", "image/png").await;

        assert_eq!(
            text,
            LocalAssistant.text_from_image(b"bytes", "image/png").await
        );
    }

    #[tokio::test]
    async fn failed_refinement_returns_the_quotation_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let assistant = GeminiAssistant::with_base_url("key", server.uri());
        let quotation = Quotation::new(chrono::Utc::now());

        let refined = assistant.refine_quotation(&quotation, "discount 5%").await;

        assert_eq!(refined, quotation);
    }

    #[tokio::test]
    async fn refinement_preserves_id_and_date() {
        let server = MockServer::start().await;
        let mut revised = Quotation::new(chrono::Utc::now());
        revised.id = "imposter".to_string();
        revised.workmanship_rate = dec!(2000);
        let body = serde_json::to_string(&revised).unwrap();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&body)))
            .mount(&server)
            .await;
        let assistant = GeminiAssistant::with_base_url("key", server.uri());
        let original = Quotation::new(chrono::Utc::now());

        let refined = assistant.refine_quotation(&original, "raise labour").await;

        assert_eq!(refined.id, original.id);
        assert_eq!(refined.date, original.date);
        assert_eq!(refined.workmanship_rate, dec!(2000));
    }
}
