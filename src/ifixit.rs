//! iFixit guide retrieval and normalization.
//!
//! [`IFixitClient`] wraps the public iFixit API (device search + guide
//! fetch); [`Guide::to_document`] flattens a fetched guide into the
//! uniform text-plus-metadata [`Document`] the ingest path consumes.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::document::Document;
use crate::error::{FixragError, Result};

/// The public iFixit API root.
const DEFAULT_BASE_URL: &str = "https://www.ifixit.com/api/2.0";

/// Per-request timeout for guide fetches.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A client for the iFixit guide API.
///
/// An API key is optional; without one the public rate limits apply.
pub struct IFixitClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl IFixitClient {
    /// Create a client with an optional API key.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FixragError::GuideSource(format!("failed to build http client: {e}")))?;
        Ok(Self { client, base_url: DEFAULT_BASE_URL.to_string(), api_key })
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| FixragError::GuideSource(format!("request to {url} failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FixragError::GuideSource(format!("{url} returned {status}")));
        }
        response
            .json()
            .await
            .map_err(|e| FixragError::GuideSource(format!("failed to parse {url}: {e}")))
    }

    /// Search for guides matching a device query.
    pub async fn search_devices(&self, query: &str) -> Result<Vec<SearchHit>> {
        debug!(query, "searching guides");
        let body: SearchResponse =
            self.get_json(format!("{}/search/{query}", self.base_url)).await?;
        Ok(body.results)
    }

    /// Fetch the full details of a single guide.
    pub async fn get_guide(&self, guide_id: u64) -> Result<Guide> {
        debug!(guide_id, "fetching guide");
        self.get_json(format!("{}/guides/{guide_id}", self.base_url)).await
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// One search result; only guide hits carry a `guideid`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// The guide identifier, when the hit is a guide.
    #[serde(default)]
    pub guideid: Option<u64>,
    /// The hit's display title.
    #[serde(default)]
    pub title: Option<String>,
}

/// A fetched repair guide.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Guide {
    /// The guide identifier.
    #[serde(default)]
    pub guideid: u64,
    /// The guide title.
    #[serde(default)]
    pub title: String,
    /// The device the guide applies to.
    #[serde(default)]
    pub device: String,
    /// The guide category (replacement, teardown, ...).
    #[serde(default, rename = "type")]
    pub guide_type: String,
    /// Difficulty rating.
    #[serde(default)]
    pub difficulty: String,
    /// Free-text introduction.
    #[serde(default)]
    pub introduction: String,
    /// Tools the guide calls for.
    #[serde(default)]
    pub tools: Vec<GuideTool>,
    /// Ordered repair steps.
    #[serde(default)]
    pub steps: Vec<GuideStep>,
    /// Canonical guide URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// A tool reference; the API populates either `text` or `name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuideTool {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One repair step with its text lines.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuideStep {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub lines: Vec<GuideLine>,
}

/// One line of step text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuideLine {
    #[serde(default)]
    pub text: String,
}

impl Guide {
    /// Flatten the guide into a normalized [`Document`].
    ///
    /// The layout keeps the title, device, difficulty, introduction, tool
    /// list, and numbered steps in a stable plain-text shape so chunk
    /// windows stay readable when quoted back as context.
    pub fn to_document(&self) -> Document {
        let mut text = String::new();
        text.push_str(&format!("Title: {}\n", self.title));
        text.push_str(&format!("Device: {}\n", self.device));
        text.push_str(&format!("Difficulty: {}\n\n", self.difficulty));

        if !self.introduction.is_empty() {
            text.push_str(&format!("Introduction:\n{}\n\n", self.introduction));
        }

        if !self.tools.is_empty() {
            text.push_str("Tools Required:\n");
            for tool in &self.tools {
                let name = tool
                    .text
                    .as_deref()
                    .or(tool.name.as_deref())
                    .unwrap_or("Unknown");
                text.push_str(&format!("- {name}\n"));
            }
            text.push('\n');
        }

        if !self.steps.is_empty() {
            text.push_str("Repair Steps:\n");
            for (i, step) in self.steps.iter().enumerate() {
                let title = if step.title.is_empty() { "Untitled" } else { &step.title };
                text.push_str(&format!("\nStep {}: {title}\n", i + 1));
                for line in &step.lines {
                    text.push_str(&format!("  {}\n", line.text));
                }
            }
        }

        let mut metadata = HashMap::new();
        metadata.insert("device".to_string(), self.device.clone());
        metadata.insert("guide_type".to_string(), self.guide_type.clone());
        metadata.insert("difficulty".to_string(), self.difficulty.clone());

        Document {
            id: format!("guide-{}", self.guideid),
            text,
            metadata,
            source_uri: self.url.clone(),
        }
    }
}
