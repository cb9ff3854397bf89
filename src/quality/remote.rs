// Remote quality scorer (C5) — calls an external model endpoint that rates
// a post's effort, creativity, and clarity on a 0..10 scale. A reqwest
// client gated behind a rate limiter, with retries for transport/timeout/
// parse failures and a neutral degraded-default fallback rather than
// surfacing the error to the caller.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::models::QualityResult;
use super::rate_limiter::RateLimiter;
use super::traits::QualityScorer;

const MAX_ATTEMPTS: u32 = 4; // initial attempt + up to 3 retries
const BASE_BACKOFF: Duration = Duration::from_secs(2);
const TOTAL_BUDGET: Duration = Duration::from_secs(60);

const QUALITY_PROMPT: &str = "Rate the effort, creativity, and clarity of the following post \
on a scale from 0 (low effort, no creativity, unclear) to 10 (exceptional effort, highly \
creative, very clear). Respond with a single integer from 0 to 10.";

pub struct RemoteQualityScorer {
    client: Client,
    endpoint: String,
    api_key: String,
    rate_limiter: RateLimiter,
}

impl RemoteQualityScorer {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
            rate_limiter: RateLimiter::new(2.0),
        }
    }

    async fn call_once(&self, text: &str, image: Option<&[u8]>) -> Result<u8> {
        let request = QualityRequest {
            prompt: QUALITY_PROMPT,
            text,
            image_base64: image.map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .context("quality model request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("quality model returned {status}");
        }

        let body: QualityResponse = response
            .json()
            .await
            .context("failed to parse quality model response")?;

        parse_first_integer(&body.completion)
            .context("quality model response contained no integer rating")
    }
}

#[async_trait]
impl QualityScorer for RemoteQualityScorer {
    async fn score(&self, text: &str, image: Option<&[u8]>) -> Result<QualityResult> {
        let deadline = Instant::now() + TOTAL_BUDGET;

        for attempt in 0..MAX_ATTEMPTS {
            if Instant::now() >= deadline {
                break;
            }

            self.rate_limiter.acquire().await;

            match self.call_once(text, image).await {
                Ok(score) => return Ok(QualityResult::ok(score)),
                Err(err) => {
                    warn!(attempt, "quality model call failed: {err:#}");
                    if attempt + 1 >= MAX_ATTEMPTS {
                        break;
                    }
                    let backoff = BASE_BACKOFF * 2u32.pow(attempt);
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    tokio::time::sleep(backoff.min(remaining)).await;
                }
            }
        }

        Ok(QualityResult::degraded_default())
    }
}

fn parse_first_integer(text: &str) -> Option<u8> {
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if !digits.is_empty() {
            break;
        }
    }
    digits.parse::<u32>().ok().map(|n| n.min(10) as u8)
}

#[derive(Serialize)]
struct QualityRequest<'a> {
    prompt: &'a str,
    text: &'a str,
    image_base64: Option<String>,
}

#[derive(Deserialize)]
struct QualityResponse {
    completion: String,
}
