use crate::ebay::client::{EbayApiError, EbayClient};
use crate::ebay::listing::ListingPolicies;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct PricingSummary {
    pub price: Price,
}

#[derive(Debug, Clone, Serialize)]
pub struct Price {
    pub value: String,
    pub currency: String,
}

impl Price {
    pub fn from_amount(amount: f64, currency: &str) -> Self {
        Self {
            value: format!("{amount:.2}"),
            currency: currency.to_string(),
        }
    }
}

/// One `{name, value: [...]}` entry of the offer's item specifics.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemSpecific {
    pub name: String,
    pub value: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub sku: String,
    pub marketplace_id: String,
    pub format: &'static str,
    pub category_id: String,
    pub listing_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_description: Option<String>,
    pub pricing_summary: PricingSummary,
    pub available_quantity: i32,
    pub merchant_location_key: String,
    pub listing_policies: ListingPolicies,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub item_specifics: Vec<ItemSpecific>,
}

#[derive(Debug, Deserialize)]
struct OfferResponse {
    #[serde(rename = "offerId", default)]
    offer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(rename = "listingId", default)]
    listing_id: Option<String>,
}

impl EbayClient {
    /// POST the offer. A 2xx without an offer id is reported as a decode
    /// error carrying the raw body, the same failure class as a non-2xx.
    pub async fn create_offer(
        &self,
        payload: &CreateOfferRequest,
        token: &str,
    ) -> Result<String, EbayApiError> {
        let request = self.http.post(self.url("/sell/inventory/v1/offer")).json(payload);
        let response = self
            .with_headers(request, token)
            .send()
            .await
            .map_err(|err| EbayApiError::Transport(err.to_string()))?;
        let response = self.check(response).await?;
        let body = response
            .text()
            .await
            .map_err(|err| EbayApiError::Decode(err.to_string()))?;
        let parsed: OfferResponse =
            serde_json::from_str(&body).map_err(|_| EbayApiError::Decode(body.clone()))?;
        parsed
            .offer_id
            .filter(|id| !id.is_empty())
            .ok_or(EbayApiError::Decode(body))
    }

    pub async fn publish_offer(
        &self,
        offer_id: &str,
        token: &str,
    ) -> Result<String, EbayApiError> {
        let url = self.url(&format!("/sell/inventory/v1/offer/{offer_id}/publish"));
        let request = self.http.post(url);
        let response = self
            .with_headers(request, token)
            .send()
            .await
            .map_err(|err| EbayApiError::Transport(err.to_string()))?;
        let response = self.check(response).await?;
        let body = response
            .text()
            .await
            .map_err(|err| EbayApiError::Decode(err.to_string()))?;
        let parsed: PublishResponse =
            serde_json::from_str(&body).map_err(|_| EbayApiError::Decode(body.clone()))?;
        parsed
            .listing_id
            .filter(|id| !id.is_empty())
            .ok_or(EbayApiError::Decode(body))
    }
}
