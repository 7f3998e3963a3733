//! Sentiment classification through the Gemini `generateContent` API.

use std::time::Duration;

use anyhow::{anyhow, Context};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::model::Sentiment;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Upper bound on one classification request.
pub const SENTIMENT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// Map the model's free-text answer onto a [`Sentiment`]. Anything that is
/// not clearly positive or negative counts as neutral.
pub fn parse_sentiment(answer: &str) -> Sentiment {
    let answer = answer.trim().to_lowercase();
    if answer.contains("positive") {
        Sentiment::Positive
    } else if answer.contains("negative") {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

fn build_prompt(message: &str) -> String {
    format!(
        "Analyze the sentiment of the following feedback message and respond with ONLY one word: \
         \"positive\", \"neutral\", or \"negative\". Do not include any other text or explanation.\n\n\
         Feedback message: \"{}\"\n\nSentiment:",
        message
    )
}

/// Client for the external classification model.
#[derive(Clone)]
pub struct SentimentClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl SentimentClient {
    pub fn new(client: Client, api_key: Option<String>, model: &str) -> Self {
        Self {
            client,
            api_key,
            endpoint: format!("{}/{}:generateContent", GEMINI_BASE_URL, model),
            timeout: SENTIMENT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point the client at a different endpoint (used against local fakes).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Classify a feedback message.
    pub async fn analyze(&self, message: &str) -> Result<Sentiment, AppError> {
        let api_key = self.api_key.as_ref().ok_or(AppError::SentimentUnavailable)?;

        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(message) }] }],
            "generationConfig": { "temperature": 0.1, "maxOutputTokens": 10 },
        });

        let resp = match self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "sentiment_request_timeout");
                return Err(AppError::Internal(anyhow!(
                    "sentiment request timed out after {}ms",
                    self.timeout.as_millis()
                )));
            }
            Err(e) => return Err(AppError::Internal(anyhow!(e).context("Sentiment request failed"))),
        };

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!(status_code = status.as_u16(), body = %text, "sentiment_api_error");
            return Err(AppError::Internal(anyhow!(
                "sentiment API returned HTTP {}",
                status.as_u16()
            )));
        }

        let parsed: GeminiResponse = resp
            .json()
            .await
            .context("Failed to decode sentiment response")?;

        let sentiment = parse_sentiment(parsed.first_text().unwrap_or(""));

        info!(sentiment = %sentiment, "sentiment_analyzed");

        Ok(sentiment)
    }
}
