/// Matcher client — the only place that talks to the external matching webhook.
///
/// The webhook receives the applicant's form fields next to the text pulled
/// out of their PDF and answers with a loosely shaped JSON message. This
/// module owns the wire format, the retry policy and the mapping of that
/// message into a `MatchVerdict`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MatcherConfig;
use crate::intake::form::ApplicationForm;

pub mod verdict;

pub use verdict::{MatchVerdict, VerdictOutcome};

/// Upper bound for a single retry delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("matcher returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("matcher returned a non-JSON body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("matcher timed out on all {attempts} attempts")]
    Timeout { attempts: u32 },
}

/// Form fields as the webhook expects them.
#[derive(Debug, Serialize)]
pub struct FormPayload<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub skills: &'a str,
    pub experience: &'a str,
}

/// Body of the outbound call: `{ "formData": {...}, "pdfText": "..." }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest<'a> {
    pub form_data: FormPayload<'a>,
    pub pdf_text: &'a str,
}

impl<'a> MatchRequest<'a> {
    pub fn new(form: &'a ApplicationForm, pdf_text: &'a str) -> Self {
        Self {
            form_data: FormPayload {
                name: &form.full_name,
                email: &form.email,
                phone: &form.phone,
                skills: &form.skills,
                experience: &form.experience,
            },
            pdf_text,
        }
    }
}

/// Judges whether a submitted form agrees with its CV text.
///
/// Carried in `AppState` as `Arc<dyn Matcher>`.
#[async_trait]
pub trait Matcher: Send + Sync {
    async fn compare(&self, request: &MatchRequest<'_>) -> Result<MatchVerdict, MatcherError>;
}

/// Matcher backed by the HTTP webhook.
#[derive(Clone)]
pub struct WebhookMatcher {
    client: Client,
    config: MatcherConfig,
}

impl WebhookMatcher {
    pub fn new(config: MatcherConfig) -> Result<Self, MatcherError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl Matcher for WebhookMatcher {
    /// Posts the request to the webhook.
    /// Retries transport errors, timeouts, 429 and 5xx with exponential backoff.
    /// Any other status with a JSON body comes back as a verdict carrying that
    /// status, so 4xx replies reach the client unchanged.
    async fn compare(&self, request: &MatchRequest<'_>) -> Result<MatchVerdict, MatcherError> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error: Option<MatcherError> = None;
        let mut last_timed_out = false;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = backoff_delay(self.config.backoff_base, attempt);
                warn!(
                    "Matcher call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.config.url)
                .header("content-type", "application/json")
                .json(request)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_timed_out = e.is_timeout();
                    last_error = Some(MatcherError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Matcher returned {}: {}", status, body);
                last_timed_out = false;
                last_error = Some(MatcherError::Status {
                    status: status.as_u16(),
                    body,
                });
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    last_timed_out = e.is_timeout();
                    last_error = Some(MatcherError::Http(e));
                    continue;
                }
            };

            let raw: Value = match serde_json::from_str(&body) {
                Ok(raw) => raw,
                Err(_) if !status.is_success() => {
                    return Err(MatcherError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) => return Err(MatcherError::Parse(e)),
            };
            let verdict = MatchVerdict::from_response(status.as_u16(), raw);

            debug!(
                "Matcher replied: status={}, outcome={:?}",
                verdict.upstream_status, verdict.outcome
            );

            return Ok(verdict);
        }

        if last_timed_out {
            return Err(MatcherError::Timeout { attempts });
        }

        Err(last_error.unwrap_or(MatcherError::Timeout { attempts }))
    }
}

/// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`,
/// capped at `MAX_BACKOFF`.
fn backoff_delay(base: Duration, retry: u32) -> Duration {
    let factor = 1u32
        .checked_shl(retry.saturating_sub(1))
        .unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}
