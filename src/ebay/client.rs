use crate::ebay::config::EbayConfig;
use crate::http::build_client;
use reqwest::{Client, RequestBuilder};
use std::future::Future;
use thiserror::Error;
use tokio::time::{Duration, sleep};
use tracing::warn;

#[derive(Debug, Error)]
pub enum EbayApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl EbayApiError {
    /// Transport failures and 5xx are worth one more shot; 4xx are not.
    pub fn is_transient(&self) -> bool {
        match self {
            EbayApiError::Transport(_) => true,
            EbayApiError::Status { status, .. } => *status >= 500,
            EbayApiError::Decode(_) => false,
        }
    }

    /// Raw marketplace response text, for persistence and diagnostics.
    pub fn raw_body(&self) -> String {
        match self {
            EbayApiError::Status { body, .. } => body.clone(),
            EbayApiError::Decode(body) => body.clone(),
            EbayApiError::Transport(message) => message.clone(),
        }
    }
}

/// Explicitly constructed marketplace client; base URL and credentials are
/// injected so tests can point it at a local server.
#[derive(Clone)]
pub struct EbayClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) config: EbayConfig,
}

impl EbayClient {
    pub fn new(config: EbayConfig) -> Self {
        Self {
            http: build_client(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
        }
    }

    pub fn marketplace_id(&self) -> &str {
        &self.config.marketplace_id
    }

    pub fn config(&self) -> &EbayConfig {
        &self.config
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Every Sell/Taxonomy call carries the bearer token and en-US locale
    /// headers.
    pub(crate) fn with_headers(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder
            .bearer_auth(token)
            .header("Content-Language", "en-US")
            .header("Accept-Language", "en-US")
    }

    /// Converts a response into `Status` with the raw body preserved so the
    /// orchestrator can persist exactly what the marketplace said.
    pub(crate) async fn check(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, EbayApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(EbayApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Bounded retry with backoff for the transactional calls. Resolution-stage
/// lookups never go through here; they degrade to fallbacks instead.
pub async fn with_retry<T, F, Fut>(label: &'static str, mut op: F) -> Result<T, EbayApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EbayApiError>>,
{
    const MAX_ATTEMPTS: u32 = 3;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
                let delay = Duration::from_millis(400 * 2u64.pow(attempt - 1));
                warn!(
                    target = "bluberry.ebay",
                    call = label,
                    attempt = attempt,
                    error = %err,
                    "transient marketplace error, retrying"
                );
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
