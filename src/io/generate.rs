//! Remote deck generation client
//!
//! Thin HTTP client for the list-generation endpoint: a category label
//! and requested count go out, an item list comes back. The response is
//! treated as an opaque provider of playable strings; anything malformed
//! or empty is an error and no session starts.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    category: &'a str,
    count: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    items: Option<Vec<String>>,
}

pub struct GenerateClient {
    url: String,
    count: u32,
    client: reqwest::Client,
}

impl GenerateClient {
    pub fn new(url: &str, count: u32, timeout_ms: u64) -> Self {
        // Create HTTP client once for reuse (connection pooling)
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();

        Self { url: url.to_string(), count, client }
    }

    /// Request a generated item list for a category.
    pub async fn generate(&self, category: &str) -> anyhow::Result<Vec<String>> {
        let start = Instant::now();
        let body = GenerateRequest { category: category.trim(), count: self.count };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("generate request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            error!(
                category = %category,
                status = %status.as_u16(),
                latency_ms = %start.elapsed().as_millis(),
                "generate_request_failed"
            );
            bail!("generate endpoint returned {}", status);
        }

        let parsed: GenerateResponse =
            response.json().await.context("generate response was not valid JSON")?;

        let Some(items) = parsed.items else {
            bail!("generate response missing items array");
        };
        if items.is_empty() {
            bail!("generate response contained no items");
        }

        info!(
            category = %category,
            items = %items.len(),
            latency_ms = %start.elapsed().as_millis(),
            "deck_generated"
        );
        Ok(items)
    }
}
