use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::{BoatClassifier, ClassifierError, Identification};
use crate::config::ClassifierConfig;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Fields requested from the upstream when the caller names none.
const DEFAULT_FIELDS: &[&str] = &["make", "model", "description", "boat_type"];

/// Per-field prompt descriptions. Unknown fields fall back to their name.
const FIELD_DESCRIPTIONS: &[(&str, &str)] = &[
    ("make", "manufacturer/brand name"),
    ("model", "specific model name"),
    ("description", "detailed physical description"),
    ("year", "estimated year or year range"),
    ("length", "estimated length in feet"),
    ("boat_type", "type (sailboat, motorboat, yacht, fishing boat, etc.)"),
    ("hull_material", "hull material (fiberglass, wood, aluminum, etc.)"),
    ("features", "notable features as an array"),
];

/// Boat classifier backed by the Anthropic Messages API.
pub struct AnthropicClassifier {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl BoatClassifier for AnthropicClassifier {
    #[instrument(skip(self, image, requested_fields), fields(image_len = image.len()))]
    async fn classify(
        &self,
        image: &[u8],
        requested_fields: &[String],
    ) -> Result<Identification, ClassifierError> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": 0.1,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": sniff_media_type(image),
                            "data": BASE64.encode(image),
                        },
                    },
                    {
                        "type": "text",
                        "text": build_prompt(requested_fields),
                    },
                ],
            }],
        });

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Service(format!(
                "upstream returned {status}: {detail}"
            )));
        }

        let message: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        let text = message
            .content
            .iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .ok_or_else(|| ClassifierError::Parse("no text content in upstream response".into()))?;

        parse_outcome(text)
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Parse the model's JSON-only reply into a structured outcome.
fn parse_outcome(text: &str) -> Result<Identification, ClassifierError> {
    serde_json::from_str(text.trim()).map_err(|e| ClassifierError::Parse(e.to_string()))
}

fn build_prompt(requested_fields: &[String]) -> String {
    let fields: Vec<&str> = if requested_fields.is_empty() {
        DEFAULT_FIELDS.to_vec()
    } else {
        requested_fields.iter().map(String::as_str).collect()
    };

    let field_lines: Vec<String> = fields
        .iter()
        .map(|&field| {
            let description = FIELD_DESCRIPTIONS
                .iter()
                .find(|(name, _)| *name == field)
                .map_or(field, |(_, description)| *description);
            format!("\"{field}\": {description}")
        })
        .collect();

    format!(
        "Analyze this image carefully and determine if it shows a boat or watercraft.\n\
         \n\
         If it IS a boat, respond with a JSON object containing:\n\
         {{\n\
         \x20   \"is_boat\": true,\n\
         \x20   \"confidence\": \"high|medium|low\",\n\
         \x20   {}\n\
         }}\n\
         \n\
         If it is NOT a boat, respond with:\n\
         {{\n\
         \x20   \"is_boat\": false,\n\
         \x20   \"confidence\": \"high\",\n\
         \x20   \"description\": \"brief description of what you see instead\"\n\
         }}\n\
         \n\
         Guidelines:\n\
         - Use \"unknown\" for fields you cannot determine\n\
         - Be specific but concise\n\
         - Confidence should reflect your certainty about the boat identification\n\
         - For features, include notable equipment, design elements, or modifications\n\
         \n\
         Respond only with valid JSON.",
        field_lines.join(",\n    ")
    )
}

/// Media type from magic bytes; uploads are validated as images, so a
/// JPEG default covers anything unrecognized.
fn sniff_media_type(image: &[u8]) -> &'static str {
    if image.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if image.starts_with(b"GIF8") {
        "image/gif"
    } else if image.starts_with(b"BM") {
        "image/bmp"
    } else if image.len() >= 12 && &image[0..4] == b"RIFF" && &image[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
