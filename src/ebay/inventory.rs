use crate::ebay::client::{EbayApiError, EbayClient};
use crate::ebay::listing::PackageWeightAndSize;
use serde::Serialize;
use std::collections::BTreeMap;
use urlencoding::encode;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemRequest {
    pub availability: InventoryAvailability,
    pub condition: String,
    pub product: InventoryProduct,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_weight_and_size: Option<PackageWeightAndSize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAvailability {
    pub ship_to_location_availability: ShipToLocationAvailability,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipToLocationAvailability {
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryProduct {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspects: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
}

impl EbayClient {
    pub async fn put_inventory_item(
        &self,
        sku: &str,
        payload: &InventoryItemRequest,
        token: &str,
    ) -> Result<(), EbayApiError> {
        let url = self.url(&format!("/sell/inventory/v1/inventory_item/{}", encode(sku)));
        let request = self.http.put(url).json(payload);
        let response = self
            .with_headers(request, token)
            .send()
            .await
            .map_err(|err| EbayApiError::Transport(err.to_string()))?;
        self.check(response).await?;
        Ok(())
    }
}
