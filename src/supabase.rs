use crate::http::build_client;
use crate::models::{EbayStatus, Submission, SubmissionStatus, SubmissionUpdate};
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    Deserialize(String),
}

/// Thin REST client over the hosted Postgres (PostgREST) and its storage
/// API. Constructed once at startup and injected; tests point it at a local
/// server.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: String,
    service_key: String,
    http: Client,
}

impl SupabaseClient {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            http: build_client(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("SUPABASE_URL").ok()?;
        let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|_| std::env::var("SUPABASE_SERVICE_KEY"))
            .ok()?;
        Some(Self::new(&base_url, &service_key))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    pub async fn fetch_submission(
        &self,
        id: &str,
    ) -> Result<Option<Submission>, SupabaseError> {
        let url = format!("{}/rest/v1/submissions", self.base_url);
        let response = self
            .authed(self.http.get(url).query(&[
                ("id", format!("eq.{id}")),
                ("select", "*".to_string()),
                ("limit", "1".to_string()),
            ]))
            .send()
            .await
            .map_err(|err| SupabaseError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SupabaseError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let mut payload: Vec<Submission> = response
            .json()
            .await
            .map_err(|err| SupabaseError::Deserialize(err.to_string()))?;
        Ok(payload.pop())
    }

    pub async fn update_submission(
        &self,
        id: &str,
        update: &SubmissionUpdate,
    ) -> Result<(), SupabaseError> {
        let url = format!("{}/rest/v1/submissions", self.base_url);
        let response = self
            .authed(self.http.patch(url).query(&[("id", format!("eq.{id}"))]))
            .json(update)
            .send()
            .await
            .map_err(|err| SupabaseError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SupabaseError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Conditional `approved/pending -> listing` transition. The status
    /// filter makes the PATCH a no-op when another attempt already holds the
    /// row; `Ok(false)` means the claim lost that race.
    pub async fn claim_for_listing(&self, id: &str) -> Result<bool, SupabaseError> {
        let url = format!("{}/rest/v1/submissions", self.base_url);
        let update = SubmissionUpdate {
            status: Some(SubmissionStatus::Listing.as_str()),
            ebay_status: Some(EbayStatus::Processing.as_str()),
            ..SubmissionUpdate::default()
        };
        let response = self
            .authed(self.http.patch(url).query(&[
                ("id", format!("eq.{id}")),
                (
                    "status",
                    format!(
                        "in.({},{})",
                        SubmissionStatus::Pending.as_str(),
                        SubmissionStatus::Approved.as_str()
                    ),
                ),
            ]))
            .header("Prefer", "return=representation")
            .json(&update)
            .send()
            .await
            .map_err(|err| SupabaseError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SupabaseError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|err| SupabaseError::Deserialize(err.to_string()))?;
        Ok(!rows.is_empty())
    }

    /// Uploads one object and returns its public URL.
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, SupabaseError> {
        let url = format!("{}/storage/v1/object/{bucket}/{path}", self.base_url);
        let response = self
            .authed(self.http.post(url))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|err| SupabaseError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SupabaseError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        Ok(format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.base_url
        ))
    }
}
