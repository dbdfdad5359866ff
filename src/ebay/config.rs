use crate::ebay::listing::ListingPolicies;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EbayConfigError {
    #[error("missing required configuration: {0}")]
    MissingVar(&'static str),
}

/// Marketplace configuration, read once at startup and injected into the
/// pipeline. Policy ids and the merchant location key are hard preconditions
/// for listing; everything else has a sandbox-friendly default.
#[derive(Debug, Clone)]
pub struct EbayConfig {
    pub environment: String,
    pub app_id: String,
    pub cert_id: String,
    pub refresh_token: String,
    pub marketplace_id: String,
    pub fulfillment_policy_id: Option<String>,
    pub payment_policy_id: Option<String>,
    pub return_policy_id: Option<String>,
    pub merchant_location_key: Option<String>,
    pub base_url: String,
}

impl EbayConfig {
    pub fn from_env() -> Self {
        let environment = env::var("EBAY_ENV").unwrap_or_else(|_| "SANDBOX".to_string());
        let base_url = if environment.eq_ignore_ascii_case("PROD") {
            "https://api.ebay.com".to_string()
        } else {
            "https://api.sandbox.ebay.com".to_string()
        };
        Self {
            environment,
            app_id: env::var("EBAY_APP_ID").unwrap_or_default(),
            cert_id: env::var("EBAY_CERT_ID").unwrap_or_default(),
            refresh_token: env::var("EBAY_REFRESH_TOKEN").unwrap_or_default(),
            marketplace_id: env::var("EBAY_MARKETPLACE_ID").unwrap_or_else(|_| "EBAY_US".into()),
            fulfillment_policy_id: non_empty(env::var("EBAY_FULFILLMENT_POLICY_ID").ok()),
            payment_policy_id: non_empty(env::var("EBAY_PAYMENT_POLICY_ID").ok()),
            return_policy_id: non_empty(env::var("EBAY_RETURN_POLICY_ID").ok()),
            merchant_location_key: non_empty(env::var("EBAY_MERCHANT_LOCATION_KEY").ok()),
            base_url,
        }
    }

    /// Fatal precondition check: listing cannot proceed without all three
    /// policy ids. Checked before any state mutation.
    pub fn listing_policies(&self) -> Result<ListingPolicies, EbayConfigError> {
        Ok(ListingPolicies {
            fulfillment_policy_id: self
                .fulfillment_policy_id
                .clone()
                .ok_or(EbayConfigError::MissingVar("EBAY_FULFILLMENT_POLICY_ID"))?,
            payment_policy_id: self
                .payment_policy_id
                .clone()
                .ok_or(EbayConfigError::MissingVar("EBAY_PAYMENT_POLICY_ID"))?,
            return_policy_id: self
                .return_policy_id
                .clone()
                .ok_or(EbayConfigError::MissingVar("EBAY_RETURN_POLICY_ID"))?,
        })
    }

    pub fn merchant_location_key(&self) -> Result<String, EbayConfigError> {
        self.merchant_location_key
            .clone()
            .ok_or(EbayConfigError::MissingVar("EBAY_MERCHANT_LOCATION_KEY"))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
