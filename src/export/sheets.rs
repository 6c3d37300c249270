//! Publishing posts to a shared cloud spreadsheet.
//!
//! Delivery goes through a configured webhook (an Apps Script endpoint or
//! similar) that accepts the tabular rows and answers with the sheet URL.
//! The publisher is an opaque capability: the pipeline only needs "rows in,
//! url out".

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::Post;

use super::spreadsheet::{post_rows, COLUMNS};
use super::ExportError;

#[derive(Debug, Serialize)]
struct PublishRequest {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    url: String,
}

/// Publishes generated posts to a shared sheet via a configured webhook.
pub struct SheetsPublisher {
    webhook: Option<String>,
    client: reqwest::Client,
}

impl SheetsPublisher {
    pub fn new(webhook: Option<String>) -> Self {
        Self {
            webhook,
            client: reqwest::Client::new(),
        }
    }

    /// Whether a webhook is configured. Unconfigured publishing fails the
    /// export, not the generation.
    pub fn is_configured(&self) -> bool {
        self.webhook.is_some()
    }

    /// Push the posts and return the shared sheet URL.
    pub async fn publish(&self, posts: &[Post]) -> Result<String, ExportError> {
        let webhook = self
            .webhook
            .as_deref()
            .ok_or(ExportError::SheetsNotConfigured)?;

        let request = PublishRequest {
            headers: COLUMNS.map(String::from).to_vec(),
            rows: post_rows(posts),
        };

        let resp = self
            .client
            .post(webhook)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExportError::Publish(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ExportError::Publish(format!("HTTP {}", resp.status())));
        }

        let body: PublishResponse = resp
            .json()
            .await
            .map_err(|e| ExportError::Publish(e.to_string()))?;

        info!(url = %body.url, "published posts to shared sheet");
        Ok(body.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_publisher_fails_cleanly() {
        let publisher = SheetsPublisher::new(None);
        assert!(!publisher.is_configured());
        let err = publisher.publish(&[]).await.unwrap_err();
        assert!(matches!(err, ExportError::SheetsNotConfigured));
    }
}
