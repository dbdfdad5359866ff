use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Submission lifecycle. The failure path returns the row to `Approved` so
/// the dashboard can retry it; `Listing` is never a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Listing,
    Listed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Listing => "listing",
            SubmissionStatus::Listed => "listed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EbayStatus {
    Processing,
    Active,
    Failed,
}

impl EbayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EbayStatus::Processing => "processing",
            EbayStatus::Active => "active",
            EbayStatus::Failed => "failed",
        }
    }
}

/// Legacy rows store one URL in `image_url`; newer rows store an array in
/// `images`. Either field may also hold the other shape, so both parse
/// through this untagged enum.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ImageField {
    Single(String),
    Multiple(Vec<String>),
}

impl ImageField {
    pub fn as_vec(&self) -> Vec<String> {
        match self {
            ImageField::Single(value) => vec![value.clone()],
            ImageField::Multiple(values) => values.clone(),
        }
    }
}

/// Stored estimated price arrives as a number or a currency-formatted
/// string depending on which intake version wrote the row.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PriceField {
    Number(f64),
    Text(String),
}

/// One row of the `submissions` table. Contact and pickup fields are
/// read-only passthrough; the pipeline never writes them.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub issues: Option<String>,
    #[serde(default)]
    pub estimated_price: Option<PriceField>,
    #[serde(default)]
    pub image_url: Option<ImageField>,
    #[serde(default)]
    pub images: Option<ImageField>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ebay_status: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub pickup_address: Option<String>,
}

impl Submission {
    /// Original image URLs, preferring the array field over the legacy
    /// single-URL field. Blank entries are dropped.
    pub fn image_urls(&self) -> Vec<String> {
        let raw = self
            .images
            .as_ref()
            .map(ImageField::as_vec)
            .filter(|urls| urls.iter().any(|u| !u.trim().is_empty()))
            .or_else(|| self.image_url.as_ref().map(ImageField::as_vec))
            .unwrap_or_default();
        raw.into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect()
    }

    pub fn condition_text(&self) -> &str {
        self.condition.as_deref().unwrap_or("").trim()
    }

    pub fn issues_text(&self) -> &str {
        match self.issues.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ => "None",
        }
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Sparse PATCH payload for the `submissions` table; only set fields are
/// serialized.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmissionUpdate {
    pub status: Option<&'static str>,
    pub ebay_status: Option<&'static str>,
    pub listing_error: Option<String>,
    pub listed_on_ebay: Option<bool>,
    pub ebay_listing_id: Option<String>,
    pub ebay_offer_id: Option<String>,
    pub ebay_sku: Option<String>,
    pub ebay_optimized_images: Option<Vec<String>>,
    pub listed_at: Option<DateTime<Utc>>,
}

impl SubmissionUpdate {
    pub fn failure(error: String) -> Self {
        Self {
            status: Some(SubmissionStatus::Approved.as_str()),
            ebay_status: Some(EbayStatus::Failed.as_str()),
            listing_error: Some(error),
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListItemRequest {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListItemResponse {
    pub success: bool,
    #[serde(rename = "listingId")]
    pub listing_id: String,
    pub ebay_listing_id: String,
    pub ebay_offer_id: String,
    pub optimized_images: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    /// Raw marketplace response body, when the failure came from eBay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_urls_prefers_array_field() {
        let submission: Submission = serde_json::from_str(
            r#"{
                "id": "sub-1",
                "name": "Lamp",
                "image_url": "https://cdn.example.com/legacy.jpg",
                "images": ["https://cdn.example.com/a.jpg", "https://cdn.example.com/b.jpg"]
            }"#,
        )
        .unwrap();
        assert_eq!(
            submission.image_urls(),
            vec![
                "https://cdn.example.com/a.jpg".to_string(),
                "https://cdn.example.com/b.jpg".to_string()
            ]
        );
    }

    #[test]
    fn image_urls_accepts_legacy_single_field() {
        let submission: Submission = serde_json::from_str(
            r#"{"id": "sub-2", "name": "Lamp", "image_url": "https://cdn.example.com/legacy.jpg"}"#,
        )
        .unwrap();
        assert_eq!(
            submission.image_urls(),
            vec!["https://cdn.example.com/legacy.jpg".to_string()]
        );
    }

    #[test]
    fn estimated_price_parses_both_shapes() {
        let numeric: Submission = serde_json::from_str(
            r#"{"id": "a", "name": "x", "estimated_price": 42.5}"#,
        )
        .unwrap();
        assert!(matches!(
            numeric.estimated_price,
            Some(PriceField::Number(v)) if (v - 42.5).abs() < f64::EPSILON
        ));

        let text: Submission =
            serde_json::from_str(r#"{"id": "b", "name": "x", "estimated_price": "$42.50"}"#)
                .unwrap();
        assert!(matches!(text.estimated_price, Some(PriceField::Text(_))));
    }

    #[test]
    fn issues_default_to_none_marker() {
        let submission: Submission =
            serde_json::from_str(r#"{"id": "c", "name": "x", "issues": "  "}"#).unwrap();
        assert_eq!(submission.issues_text(), "None");
    }

    #[test]
    fn failure_update_pairs_failed_with_approved() {
        let update = SubmissionUpdate::failure("boom".into());
        assert_eq!(update.status, Some("approved"));
        assert_eq!(update.ebay_status, Some("failed"));
        assert_eq!(update.listing_error.as_deref(), Some("boom"));
        assert!(update.listed_on_ebay.is_none());
    }
}
