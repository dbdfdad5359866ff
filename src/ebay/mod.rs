pub mod auth;
pub mod client;
pub mod config;
pub mod inventory;
pub mod listing;
pub mod offers;
pub mod taxonomy;

pub use client::{EbayApiError, EbayClient};
pub use config::EbayConfig;
pub use listing::ListingPolicies;
