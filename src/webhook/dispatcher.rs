// Webhook dispatcher (C11) — delivers async post-submission results.
// Retry policy (exponential backoff base 1s, cap 60s, up to 5 attempts)
// treats any non-2xx and network error as transient except when the
// attempt budget is exhausted.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{error, warn};

use super::models::WebhookPayload;

const MAX_ATTEMPTS: u32 = 5;
const BASE_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

pub struct WebhookDispatcher {
    client: Client,
}

impl Default for WebhookDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookDispatcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Deliver `payload` to `url`. Logs and drops on final failure — the
    /// caller never sees a retriable error; the underlying scoring is never
    /// retried because of a webhook failure.
    pub async fn dispatch(&self, url: &str, payload: &WebhookPayload) {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.try_once(url, payload).await {
                Ok(()) => return,
                Err(Retryable(message)) => {
                    if attempt >= MAX_ATTEMPTS {
                        error!(url, attempt, "webhook delivery failed permanently: {message}");
                        return;
                    }
                    let backoff = (BASE_BACKOFF * 2u32.pow(attempt - 1)).min(MAX_BACKOFF);
                    warn!(
                        url,
                        attempt, "webhook delivery failed, retrying in {:?}: {message}", backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn try_once(&self, url: &str, payload: &WebhookPayload) -> Result<(), Retryable> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|err| Retryable(err.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }

        if is_transient(response.status()) {
            Err(Retryable(format!("HTTP {}", response.status())))
        } else {
            // Non-transient client errors (4xx other than 408/429) are
            // logged once and dropped rather than retried.
            error!(url, status = %response.status(), "webhook rejected, not retrying");
            Ok(())
        }
    }
}

struct Retryable(String);

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::TOO_MANY_REQUESTS
}
