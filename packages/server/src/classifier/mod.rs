mod anthropic;

pub use anthropic::AnthropicClassifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upstream classification failure kinds.
///
/// Parse failures and service failures stay distinguishable so the HTTP
/// layer can report them separately. Neither is retried.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The upstream responded, but not with the expected structured shape.
    #[error("unparseable classifier response: {0}")]
    Parse(String),
    /// The call itself failed: transport, timeout, quota, auth.
    #[error("classification service error: {0}")]
    Service(String),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(err: reqwest::Error) -> Self {
        Self::Service(err.to_string())
    }
}

/// Structured outcome of classifying one image.
///
/// This is also the shape persisted verbatim as the identification
/// payload; absent fields are omitted from the stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub is_boat: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boat_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hull_material: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Vision model that determines whether an image shows a boat and, if
/// so, describes it.
#[async_trait]
pub trait BoatClassifier: Send + Sync {
    /// Classify an image. An empty `requested_fields` list means the
    /// default core subset (make, model, description, boat type).
    async fn classify(
        &self,
        image: &[u8],
        requested_fields: &[String],
    ) -> Result<Identification, ClassifierError>;
}
