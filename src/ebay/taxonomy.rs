//! Taxonomy and metadata lookups: category tree, category suggestions,
//! aspect metadata, and per-category condition policies. All of these feed
//! fallback-tolerant pipeline stages; callers convert errors into degraded
//! resolutions rather than aborting the listing.

use crate::ebay::client::{EbayApiError, EbayClient};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryTreeResponse {
    #[serde(rename = "categoryTreeId")]
    pub category_tree_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategorySuggestionsResponse {
    #[serde(rename = "categorySuggestions", default)]
    pub category_suggestions: Vec<CategorySuggestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategorySuggestion {
    pub category: Option<SuggestedCategory>,
    /// Relevancy score; absent entries rank below any scored entry.
    #[serde(rename = "categoryTreeNodeLevel", default)]
    pub category_tree_node_level: Option<u32>,
    #[serde(default)]
    pub relevancy: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestedCategory {
    #[serde(rename = "categoryId", default)]
    pub category_id: Option<String>,
    #[serde(rename = "categoryName", default)]
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AspectMetadataResponse {
    #[serde(default)]
    pub aspects: Vec<AspectMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AspectMetadata {
    #[serde(rename = "localizedAspectName")]
    pub localized_aspect_name: String,
    #[serde(rename = "aspectValues", default)]
    pub aspect_values: Vec<AspectValue>,
    #[serde(rename = "aspectConstraint", default)]
    pub aspect_constraint: Option<AspectConstraint>,
}

impl AspectMetadata {
    pub fn is_required(&self) -> bool {
        self.aspect_constraint
            .as_ref()
            .and_then(|c| c.aspect_required)
            .unwrap_or(false)
    }

    pub fn allowed_values(&self) -> Vec<String> {
        self.aspect_values
            .iter()
            .map(|v| v.localized_value.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AspectValue {
    #[serde(rename = "localizedValue")]
    pub localized_value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AspectConstraint {
    #[serde(rename = "aspectRequired", default)]
    pub aspect_required: Option<bool>,
    #[serde(rename = "aspectMode", default)]
    pub aspect_mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionPoliciesResponse {
    #[serde(rename = "itemConditionPolicies", default)]
    pub item_condition_policies: Vec<ConditionPolicy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionPolicy {
    #[serde(rename = "categoryId", default)]
    pub category_id: Option<String>,
    #[serde(rename = "itemConditions", default)]
    pub item_conditions: Vec<ItemCondition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemCondition {
    #[serde(rename = "conditionId")]
    pub condition_id: String,
    #[serde(rename = "conditionDescription", default)]
    pub condition_description: Option<String>,
}

impl EbayClient {
    pub async fn default_category_tree_id(&self, token: &str) -> Result<String, EbayApiError> {
        let request = self
            .http
            .get(self.url("/commerce/taxonomy/v1/get_default_category_tree_id"))
            .query(&[("marketplace_id", self.marketplace_id())]);
        let response = self
            .with_headers(request, token)
            .send()
            .await
            .map_err(|err| EbayApiError::Transport(err.to_string()))?;
        let response = self.check(response).await?;
        let payload: CategoryTreeResponse = response
            .json()
            .await
            .map_err(|err| EbayApiError::Decode(err.to_string()))?;
        Ok(payload.category_tree_id)
    }

    pub async fn category_suggestions(
        &self,
        tree_id: &str,
        query: &str,
        token: &str,
    ) -> Result<Vec<CategorySuggestion>, EbayApiError> {
        let request = self
            .http
            .get(self.url(&format!(
                "/commerce/taxonomy/v1/category_tree/{tree_id}/get_category_suggestions"
            )))
            .query(&[("q", query)]);
        let response = self
            .with_headers(request, token)
            .send()
            .await
            .map_err(|err| EbayApiError::Transport(err.to_string()))?;
        let response = self.check(response).await?;
        let payload: CategorySuggestionsResponse = response
            .json()
            .await
            .map_err(|err| EbayApiError::Decode(err.to_string()))?;
        Ok(payload.category_suggestions)
    }

    pub async fn item_aspects(
        &self,
        tree_id: &str,
        category_id: &str,
        token: &str,
    ) -> Result<Vec<AspectMetadata>, EbayApiError> {
        let request = self
            .http
            .get(self.url(&format!(
                "/commerce/taxonomy/v1/category_tree/{tree_id}/get_item_aspects_for_category"
            )))
            .query(&[("category_id", category_id)]);
        let response = self
            .with_headers(request, token)
            .send()
            .await
            .map_err(|err| EbayApiError::Transport(err.to_string()))?;
        let response = self.check(response).await?;
        let payload: AspectMetadataResponse = response
            .json()
            .await
            .map_err(|err| EbayApiError::Decode(err.to_string()))?;
        Ok(payload.aspects)
    }

    /// Allowed condition enum ids for one category. Empty on a policy
    /// without conditions; the caller treats lookup failure the same way.
    pub async fn allowed_conditions(
        &self,
        category_id: &str,
        token: &str,
    ) -> Result<Vec<String>, EbayApiError> {
        let request = self
            .http
            .get(self.url(&format!(
                "/sell/metadata/v1/marketplace/{}/get_item_condition_policies",
                self.marketplace_id()
            )))
            .query(&[("filter", format!("categoryIds:{{{category_id}}}"))]);
        let response = self
            .with_headers(request, token)
            .send()
            .await
            .map_err(|err| EbayApiError::Transport(err.to_string()))?;
        let response = self.check(response).await?;
        let payload: ConditionPoliciesResponse = response
            .json()
            .await
            .map_err(|err| EbayApiError::Decode(err.to_string()))?;
        let mut policies = payload.item_condition_policies;
        let matched = policies
            .iter()
            .position(|p| p.category_id.as_deref() == Some(category_id));
        let policy = match matched {
            Some(idx) => Some(policies.swap_remove(idx)),
            None => policies.into_iter().next(),
        };
        Ok(policy
            .map(|p| p.item_conditions.into_iter().map(|c| c.condition_id).collect())
            .unwrap_or_default())
    }
}
