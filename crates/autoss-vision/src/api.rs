//! Tagger backed by the Computer Vision `analyze` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use autoss_types::{Settings, TagFeature};

use super::{dedupe_tags, TagError, Tagger};

/// Path of the analyze operation below the service endpoint.
const ANALYZE_PATH: &str = "vision/v2.0/analyze";

/// Header carrying the subscription key.
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Configuration for the Computer Vision tagger.
#[derive(Debug, Clone)]
pub struct ComputerVisionConfig {
    /// Service endpoint (e.g., "https://westus.api.cognitive.microsoft.com")
    pub endpoint: String,

    /// Subscription key
    pub subscription_key: SecretString,

    /// Which response section supplies the tags
    pub feature: TagFeature,

    /// Response language
    pub language: String,

    /// Request timeout
    pub timeout: Duration,
}

impl ComputerVisionConfig {
    pub fn new(endpoint: impl Into<String>, subscription_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            subscription_key: SecretString::from(subscription_key.into()),
            feature: TagFeature::Description,
            language: "en".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Build from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, TagError> {
        let endpoint = settings
            .compvision_endpoint
            .clone()
            .ok_or_else(|| TagError::Config("compvision_endpoint is not set".to_string()))?;
        let subscription_key = settings
            .compvision_subkey
            .clone()
            .ok_or_else(|| TagError::Config("compvision_subkey is not set".to_string()))?;

        Ok(Self {
            endpoint,
            subscription_key,
            feature: settings.compvision_feature,
            language: settings.compvision_language.clone(),
            timeout: Duration::from_secs(settings.compvision_timeout_secs),
        })
    }

    pub fn with_feature(mut self, feature: TagFeature) -> Self {
        self.feature = feature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn analyze_url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), ANALYZE_PATH)
    }
}

fn feature_param(feature: TagFeature) -> &'static str {
    match feature {
        TagFeature::Description => "Description",
        TagFeature::Tags => "Tags",
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    description: Option<Description>,
    #[serde(default)]
    tags: Option<Vec<TagEntry>>,
}

#[derive(Debug, Deserialize)]
struct Description {
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Error payload; the service has used both shapes.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Computer Vision tagger. One request per image, no retries.
pub struct ComputerVisionTagger {
    client: Client,
    config: ComputerVisionConfig,
}

impl ComputerVisionTagger {
    pub fn new(config: ComputerVisionConfig) -> Result<Self, TagError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TagError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn extract_tags(&self, body: &str) -> Result<Vec<String>, TagError> {
        let parsed: AnalyzeResponse =
            serde_json::from_str(body).map_err(|e| TagError::Parse(e.to_string()))?;

        let tags = match self.config.feature {
            TagFeature::Description => parsed
                .description
                .map(|d| d.tags)
                .ok_or_else(|| TagError::Parse("response has no description".to_string()))?,
            TagFeature::Tags => parsed
                .tags
                .map(|t| t.into_iter().map(|e| e.name).collect())
                .ok_or_else(|| TagError::Parse("response has no tags".to_string()))?,
        };

        Ok(dedupe_tags(tags))
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            error: Some(ErrorDetail { message: Some(m) }),
            ..
        }) => m,
        Ok(ErrorResponse {
            message: Some(m), ..
        }) => m,
        _ => body.chars().take(200).collect(),
    }
}

#[async_trait]
impl Tagger for ComputerVisionTagger {
    async fn tag_image(&self, image: &[u8]) -> Result<Vec<String>, TagError> {
        debug!(bytes = image.len(), "Calling analyze API");

        let response = self
            .client
            .post(self.config.analyze_url())
            .query(&[
                ("visualFeatures", feature_param(self.config.feature)),
                ("language", self.config.language.as_str()),
            ])
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(
                SUBSCRIPTION_KEY_HEADER,
                self.config.subscription_key.expose_secret(),
            )
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TagError::Timeout
                } else {
                    TagError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TagError::Timeout
            } else {
                TagError::Transport(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(TagError::Service {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let tags = self.extract_tags(&body)?;
        debug!(count = tags.len(), "Analyze API returned tags");
        Ok(tags)
    }
}
