use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPolicies {
    pub fulfillment_policy_id: String,
    pub payment_policy_id: String,
    pub return_policy_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageWeightAndSize {
    pub package_weight: Weight,
    pub package_size: Dimensions,
}

#[derive(Debug, Clone, Serialize)]
pub struct Weight {
    pub value: f64,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dimensions {
    pub height: f64,
    pub length: f64,
    pub width: f64,
    pub unit: &'static str,
}

/// Household items have no measured dimensions at intake; the marketplace
/// still requires a package block, so every listing ships this default.
pub fn default_package() -> PackageWeightAndSize {
    PackageWeightAndSize {
        package_weight: Weight {
            value: 5.0,
            unit: "POUND",
        },
        package_size: Dimensions {
            height: 12.0,
            length: 16.0,
            width: 16.0,
            unit: "INCH",
        },
    }
}
