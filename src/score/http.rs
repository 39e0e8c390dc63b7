//! HTTP Score Collaborator
//!
//! Posts score deltas to the external score service:
//! `POST {base}/api/update_score` with `{"username", "score_change"}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::score::{ScoreError, ScoreReporter};

#[derive(Serialize)]
struct UpdateRequest<'a> {
    username: &'a str,
    score_change: i64,
}

#[derive(Deserialize)]
struct UpdateResponse {
    new_score: Option<i64>,
}

/// Reporter backed by the score service's HTTP API.
pub struct HttpScoreReporter {
    client: Client,
    endpoint: String,
}

impl HttpScoreReporter {
    /// Create a reporter for the service at `base_url`.
    ///
    /// A bare host (no scheme) gets an `http://` prefix; internal
    /// deployments address the service without one.
    pub fn new(base_url: &str) -> Self {
        let base = normalize_base_url(base_url);
        Self {
            client: Client::new(),
            endpoint: format!("{}/api/update_score", base.trim_end_matches('/')),
        }
    }

    /// The resolved update endpoint (for logging and tests).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn normalize_base_url(base_url: &str) -> String {
    if base_url.starts_with("http://") || base_url.starts_with("https://") {
        base_url.to_owned()
    } else {
        format!("http://{base_url}")
    }
}

#[async_trait]
impl ScoreReporter for HttpScoreReporter {
    async fn report_score(&self, username: &str, delta: i64) -> Result<(), ScoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ScoreError::EmptyUsername);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&UpdateRequest {
                username,
                score_change: delta,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScoreError::Rejected {
                status: response.status().as_u16(),
            });
        }

        let body: UpdateResponse = response.json().await?;
        info!(
            username = %username,
            delta,
            new_score = ?body.new_score,
            "score update accepted"
        );
        Ok(())
    }
}
