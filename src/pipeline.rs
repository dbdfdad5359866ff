//! The listing pipeline: takes one persisted submission id and drives it
//! through category/aspect/condition resolution, image preparation, and the
//! three-call inventory -> offer -> publish transition, persisting status at
//! every failure point. Resolution stages degrade to fallbacks; only the
//! transactional marketplace calls and the config/auth preconditions can
//! abort an attempt.

use crate::aspects;
use crate::condition::map_condition;
use crate::description;
use crate::ebay::auth::SELL_SCOPES;
use crate::ebay::client::{EbayApiError, EbayClient, with_retry};
use crate::ebay::inventory::{
    InventoryAvailability, InventoryItemRequest, InventoryProduct, ShipToLocationAvailability,
};
use crate::ebay::listing::default_package;
use crate::ebay::offers::{CreateOfferRequest, Price, PricingSummary};
use crate::ebay::taxonomy::{AspectMetadata, CategorySuggestion};
use crate::images::ImagePreparer;
use crate::models::{
    EbayStatus, ListItemResponse, PriceField, SubmissionStatus, SubmissionUpdate,
};
use crate::supabase::SupabaseClient;
use chrono::Utc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Used when the taxonomy service yields nothing usable for an item title.
const FALLBACK_CATEGORY_ID: &str = "171485";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    Config,
    Marketplace,
    Internal,
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {detail}")]
pub struct ListingError {
    stage: &'static str,
    detail: String,
    kind: ListingErrorKind,
    /// Raw marketplace response body, kept verbatim for diagnostics.
    response: Option<String>,
}

impl ListingError {
    pub fn new(kind: ListingErrorKind, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
            kind,
            response: None,
        }
    }

    fn marketplace(stage: &'static str, err: &EbayApiError) -> Self {
        Self {
            stage,
            detail: err.to_string(),
            kind: ListingErrorKind::Marketplace,
            response: Some(err.raw_body()),
        }
    }

    pub fn kind(&self) -> ListingErrorKind {
        self.kind
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn response_body(&self) -> Option<&str> {
        self.response.as_deref()
    }
}

/// Outcome of a fallback-tolerant stage: either the real value, or a
/// fallback with the reason the real lookup was abandoned.
#[derive(Debug, Clone)]
pub enum Resolution<T> {
    Full(T),
    Degraded(T, String),
}

impl<T> Resolution<T> {
    pub fn value(&self) -> &T {
        match self {
            Resolution::Full(value) | Resolution::Degraded(value, _) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Resolution::Full(value) | Resolution::Degraded(value, _) => value,
        }
    }

    fn log(&self, stage: &'static str, submission_id: &str) {
        if let Resolution::Degraded(_, reason) = self {
            warn!(
                target = "bluberry.pipeline",
                submission_id = submission_id,
                stage = stage,
                reason = %reason,
                "stage degraded to fallback"
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategory {
    pub category_id: String,
    pub category_tree_id: String,
}

#[derive(Debug, Clone)]
pub struct ListingOutcome {
    pub listing_id: String,
    pub offer_id: String,
    pub sku: String,
    pub optimized_images: Vec<String>,
    pub warning: Option<String>,
}

impl ListingOutcome {
    pub fn into_response(self) -> ListItemResponse {
        ListItemResponse {
            success: true,
            listing_id: self.listing_id.clone(),
            ebay_listing_id: self.listing_id,
            ebay_offer_id: self.offer_id,
            optimized_images: self.optimized_images,
            message: "Item listed on eBay".to_string(),
            warning: self.warning,
        }
    }
}

/// All collaborators are injected; the process entry point owns their
/// lifecycle.
#[derive(Clone)]
pub struct ListingPipeline {
    supabase: SupabaseClient,
    ebay: EbayClient,
    images: ImagePreparer,
}

impl ListingPipeline {
    pub fn new(supabase: SupabaseClient, ebay: EbayClient, images: ImagePreparer) -> Self {
        Self {
            supabase,
            ebay,
            images,
        }
    }

    pub async fn run(&self, submission_id: &str) -> Result<ListingOutcome, ListingError> {
        let started = Instant::now();
        let attempt_id = Uuid::new_v4();
        info!(
            target = "bluberry.pipeline",
            submission_id = submission_id,
            attempt_id = %attempt_id,
            "listing attempt started"
        );

        let submission = self
            .supabase
            .fetch_submission(submission_id)
            .await
            .map_err(|err| {
                ListingError::new(ListingErrorKind::Internal, "load_submission", err.to_string())
            })?
            .ok_or_else(|| {
                ListingError::new(
                    ListingErrorKind::NotFound,
                    "load_submission",
                    format!("submission {submission_id} not found"),
                )
            })?;

        // Preconditions come before the status transition so a config or
        // auth failure can never strand the row in `listing`.
        let policies = self.ebay.config().listing_policies().map_err(|err| {
            ListingError::new(ListingErrorKind::Config, "ebay_config", err.to_string())
        })?;
        let merchant_location_key = self.ebay.config().merchant_location_key().map_err(|err| {
            ListingError::new(ListingErrorKind::Config, "ebay_config", err.to_string())
        })?;
        let token = self
            .ebay
            .user_access_token(SELL_SCOPES)
            .await
            .map_err(|err| {
                ListingError::new(ListingErrorKind::Internal, "ebay_auth", err.to_string())
            })?;

        // Conditional claim: a second concurrent attempt for the same row
        // loses here instead of producing a duplicate listing. A transport
        // failure on the claim itself is survivable.
        match self.supabase.claim_for_listing(submission_id).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(ListingError::new(
                    ListingErrorKind::Conflict,
                    "claim_submission",
                    format!("submission {submission_id} is not in a listable state"),
                ));
            }
            Err(err) => {
                warn!(
                    target = "bluberry.pipeline",
                    submission_id = submission_id,
                    error = %err,
                    "could not persist listing transition; continuing"
                );
            }
        }

        let category = self.resolve_category(&submission.name, &token).await;
        category.log("resolve_category", submission_id);
        let category = category.into_value();

        let allowed_conditions = match self
            .ebay
            .allowed_conditions(&category.category_id, &token)
            .await
        {
            Ok(conditions) => conditions,
            Err(err) => {
                warn!(
                    target = "bluberry.pipeline",
                    submission_id = submission_id,
                    error = %err,
                    "condition policy lookup failed; mapper falls back to standard enums"
                );
                Vec::new()
            }
        };
        let condition_id = map_condition(submission.condition_text(), &allowed_conditions);

        let required_aspects = self.fetch_required_aspects(&category, &token).await;
        required_aspects.log("fetch_aspects", submission_id);
        let required_aspects = required_aspects.into_value();

        let original_urls = submission.image_urls();
        let image_urls = self.prepare_images(&original_urls, submission_id).await;
        image_urls.log("prepare_images", submission_id);
        let image_urls = image_urls.into_value();

        let mut aspect_map = aspects::auto_fill(
            &required_aspects,
            &submission.name,
            submission.description_text(),
        );
        aspects::apply_overrides(
            &mut aspect_map,
            &condition_id,
            &submission.name,
            submission.description_text(),
        );
        let aspect_map = aspects::cleanup(aspect_map);
        let item_specifics = aspects::to_item_specifics(&aspect_map);

        let sanitized = description::sanitize(submission.description_text());
        let brand = aspect_map
            .get("Brand")
            .and_then(|values| values.first())
            .cloned()
            .unwrap_or_else(|| "Unbranded".to_string());
        let display_condition = if submission.condition_text().is_empty() {
            condition_id.clone()
        } else {
            submission.condition_text().to_string()
        };
        let listing_html = description::build_listing_html(
            &submission.name,
            &sanitized,
            &display_condition,
            &brand,
        );
        let condition_note =
            description::condition_note(submission.condition_text(), submission.issues_text());

        let sku = format!("ITEM-{submission_id}-{}", Utc::now().timestamp_millis());

        // --- the three-call state transition -------------------------------

        let inventory_payload = InventoryItemRequest {
            availability: InventoryAvailability {
                ship_to_location_availability: ShipToLocationAvailability { quantity: 1 },
            },
            condition: condition_id.clone(),
            product: InventoryProduct {
                title: submission.name.clone(),
                description: listing_html.clone(),
                aspects: if aspect_map.is_empty() {
                    None
                } else {
                    Some(aspect_map.clone())
                },
                image_urls: image_urls.clone(),
            },
            package_weight_and_size: Some(default_package()),
        };
        self.stage_elapsed("create_inventory_item", started.elapsed().as_millis());
        if let Err(err) = with_retry("put_inventory_item", || {
            self.ebay.put_inventory_item(&sku, &inventory_payload, &token)
        })
        .await
        {
            self.persist_failure(submission_id, &err).await;
            return Err(ListingError::marketplace("create_inventory_item", &err));
        }

        let price = parse_price(submission.estimated_price.as_ref());
        let offer_payload = CreateOfferRequest {
            sku: sku.clone(),
            marketplace_id: self.ebay.marketplace_id().to_string(),
            format: "FIXED_PRICE",
            category_id: category.category_id.clone(),
            listing_description: listing_html.clone(),
            condition: Some(condition_id.clone()),
            condition_description: Some(condition_note),
            pricing_summary: PricingSummary {
                price: Price::from_amount(price, "USD"),
            },
            available_quantity: 1,
            merchant_location_key,
            listing_policies: policies,
            item_specifics,
        };
        self.stage_elapsed("create_offer", started.elapsed().as_millis());
        let offer_id = match with_retry("create_offer", || {
            self.ebay.create_offer(&offer_payload, &token)
        })
        .await
        {
            Ok(offer_id) => offer_id,
            Err(err) => {
                self.persist_failure(submission_id, &err).await;
                return Err(ListingError::marketplace("create_offer", &err));
            }
        };

        self.stage_elapsed("publish_offer", started.elapsed().as_millis());
        let listing_id = match with_retry("publish_offer", || {
            self.ebay.publish_offer(&offer_id, &token)
        })
        .await
        {
            Ok(listing_id) => listing_id,
            Err(err) => {
                self.persist_failure(submission_id, &err).await;
                return Err(ListingError::marketplace("publish_offer", &err));
            }
        };

        // The marketplace listing exists now; a failed mirror write must not
        // turn success into failure.
        let success_update = SubmissionUpdate {
            status: Some(SubmissionStatus::Listed.as_str()),
            ebay_status: Some(EbayStatus::Active.as_str()),
            listed_on_ebay: Some(true),
            ebay_listing_id: Some(listing_id.clone()),
            ebay_offer_id: Some(offer_id.clone()),
            ebay_sku: Some(sku.clone()),
            ebay_optimized_images: Some(image_urls.clone()),
            listed_at: Some(Utc::now()),
            ..SubmissionUpdate::default()
        };
        let warning = match self
            .supabase
            .update_submission(submission_id, &success_update)
            .await
        {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    target = "bluberry.pipeline",
                    submission_id = submission_id,
                    error = %err,
                    "listing succeeded but final persistence write failed"
                );
                Some(format!(
                    "listed on eBay but local status update failed: {err}"
                ))
            }
        };

        info!(
            target = "bluberry.pipeline",
            submission_id = submission_id,
            attempt_id = %attempt_id,
            listing_id = %listing_id,
            offer_id = %offer_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "listing attempt succeeded"
        );

        Ok(ListingOutcome {
            listing_id,
            offer_id,
            sku,
            optimized_images: image_urls,
            warning,
        })
    }

    /// Tree id, then suggestions for the title; best relevancy wins. Any
    /// failure degrades to the hardcoded fallback category.
    async fn resolve_category(&self, title: &str, token: &str) -> Resolution<ResolvedCategory> {
        let tree_id = match self.ebay.default_category_tree_id(token).await {
            Ok(tree_id) => tree_id,
            Err(err) => {
                return Resolution::Degraded(
                    ResolvedCategory {
                        category_id: FALLBACK_CATEGORY_ID.to_string(),
                        category_tree_id: "0".to_string(),
                    },
                    format!("default category tree lookup failed: {err}"),
                );
            }
        };

        let suggestions = match self.ebay.category_suggestions(&tree_id, title, token).await {
            Ok(suggestions) => suggestions,
            Err(err) => {
                return Resolution::Degraded(
                    ResolvedCategory {
                        category_id: FALLBACK_CATEGORY_ID.to_string(),
                        category_tree_id: tree_id,
                    },
                    format!("category suggestion lookup failed: {err}"),
                );
            }
        };

        match best_suggestion(&suggestions) {
            Some(category_id) => Resolution::Full(ResolvedCategory {
                category_id,
                category_tree_id: tree_id,
            }),
            None => Resolution::Degraded(
                ResolvedCategory {
                    category_id: FALLBACK_CATEGORY_ID.to_string(),
                    category_tree_id: tree_id,
                },
                "no usable category suggestion".to_string(),
            ),
        }
    }

    /// Required aspects only; an empty list (including on failure) simply
    /// means auto-fill has nothing to do.
    async fn fetch_required_aspects(
        &self,
        category: &ResolvedCategory,
        token: &str,
    ) -> Resolution<Vec<AspectMetadata>> {
        match self
            .ebay
            .item_aspects(&category.category_tree_id, &category.category_id, token)
            .await
        {
            Ok(aspects) => Resolution::Full(
                aspects
                    .into_iter()
                    .filter(AspectMetadata::is_required)
                    .collect(),
            ),
            Err(err) => {
                Resolution::Degraded(Vec::new(), format!("aspect lookup failed: {err}"))
            }
        }
    }

    /// Optimized URLs when any image survived preparation, otherwise the
    /// originals: listing is never blocked on image optimization.
    async fn prepare_images(
        &self,
        original_urls: &[String],
        submission_id: &str,
    ) -> Resolution<Vec<String>> {
        if original_urls.is_empty() {
            return Resolution::Degraded(Vec::new(), "submission has no images".to_string());
        }
        let prepared = self.images.prepare(original_urls, submission_id).await;
        if prepared.is_empty() {
            Resolution::Degraded(
                original_urls.to_vec(),
                "image optimization produced nothing; using original urls".to_string(),
            )
        } else {
            Resolution::Full(prepared)
        }
    }

    async fn persist_failure(&self, submission_id: &str, err: &EbayApiError) {
        let update = SubmissionUpdate::failure(err.raw_body());
        if let Err(persist_err) = self.supabase.update_submission(submission_id, &update).await {
            warn!(
                target = "bluberry.pipeline",
                submission_id = submission_id,
                error = %persist_err,
                "failed to persist failure state"
            );
        }
    }

    fn stage_elapsed(&self, stage: &'static str, elapsed_ms: u128) {
        crate::metrics::stage_elapsed(stage, elapsed_ms);
    }
}

/// Highest relevancy wins; ties resolve to the first-encountered maximum.
/// Suggestions without a category id never win.
fn best_suggestion(suggestions: &[CategorySuggestion]) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;
    for suggestion in suggestions {
        let Some(category_id) = suggestion
            .category
            .as_ref()
            .and_then(|c| c.category_id.as_deref())
            .filter(|id| !id.is_empty())
        else {
            continue;
        };
        let score = suggestion.relevancy.unwrap_or(f64::MIN);
        match best {
            Some((current, _)) if score <= current => {}
            _ => best = Some((score, category_id)),
        }
    }
    best.map(|(_, id)| id.to_string())
}

/// Stored price may be numeric or currency-formatted text; strip everything
/// but digits and the decimal point and never fail.
pub fn parse_price(field: Option<&PriceField>) -> f64 {
    match field {
        Some(PriceField::Number(value)) if value.is_finite() && *value > 0.0 => *value,
        Some(PriceField::Text(text)) => {
            let cleaned: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            cleaned.parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebay::taxonomy::SuggestedCategory;

    fn suggestion(id: Option<&str>, relevancy: Option<f64>) -> CategorySuggestion {
        CategorySuggestion {
            category: id.map(|id| SuggestedCategory {
                category_id: Some(id.to_string()),
                category_name: None,
            }),
            category_tree_node_level: None,
            relevancy,
        }
    }

    #[test]
    fn best_suggestion_picks_max_relevancy() {
        let suggestions = vec![
            suggestion(Some("100"), Some(0.2)),
            suggestion(Some("200"), Some(0.9)),
            suggestion(Some("300"), Some(0.5)),
        ];
        assert_eq!(best_suggestion(&suggestions).as_deref(), Some("200"));
    }

    #[test]
    fn best_suggestion_breaks_ties_on_first_maximum() {
        let suggestions = vec![
            suggestion(Some("first"), Some(0.7)),
            suggestion(Some("second"), Some(0.7)),
        ];
        assert_eq!(best_suggestion(&suggestions).as_deref(), Some("first"));
    }

    #[test]
    fn best_suggestion_skips_entries_without_ids() {
        let suggestions = vec![
            suggestion(None, Some(0.99)),
            suggestion(Some("real"), Some(0.1)),
        ];
        assert_eq!(best_suggestion(&suggestions).as_deref(), Some("real"));
    }

    #[test]
    fn best_suggestion_empty_means_fallback() {
        assert_eq!(best_suggestion(&[]), None);
    }

    #[test]
    fn price_parsing_handles_currency_text() {
        assert_eq!(
            parse_price(Some(&PriceField::Text("$1,234.50".into()))),
            1234.50
        );
        assert_eq!(parse_price(Some(&PriceField::Number(42.0))), 42.0);
        assert_eq!(parse_price(Some(&PriceField::Text("call me".into()))), 0.0);
        assert_eq!(parse_price(None), 0.0);
    }
}
