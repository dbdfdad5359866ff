use crate::ebay::client::{EbayApiError, EbayClient};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::Deserialize;

pub const SELL_SCOPES: &[&str] = &[
    "https://api.ebay.com/oauth/api_scope/sell.inventory",
    "https://api.ebay.com/oauth/api_scope/sell.account",
];

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl EbayClient {
    /// Exchanges the long-lived refresh token for a user access token.
    /// Missing app credentials are a configuration failure, not a
    /// marketplace one.
    pub async fn user_access_token(&self, scopes: &[&str]) -> Result<String, EbayApiError> {
        if self.config.app_id.is_empty() || self.config.cert_id.is_empty() {
            return Err(EbayApiError::Transport(
                "missing ebay app credentials in env".into(),
            ));
        }
        if self.config.refresh_token.is_empty() {
            return Err(EbayApiError::Transport("EBAY_REFRESH_TOKEN is not set".into()));
        }
        // Some proxies drop reqwest's basic_auth on redirect; send it as an
        // explicit header as well.
        let basic = BASE64.encode(format!("{}:{}", self.config.app_id, self.config.cert_id));
        let body = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.config.refresh_token.as_str()),
            ("scope", &scopes.join(" ")),
        ];
        let response = self
            .http
            .post(self.url("/identity/v1/oauth2/token"))
            .header("Authorization", format!("Basic {basic}"))
            .form(&body)
            .send()
            .await
            .map_err(|err| EbayApiError::Transport(err.to_string()))?;
        let response = self.check(response).await?;
        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|err| EbayApiError::Decode(err.to_string()))?;
        Ok(payload.access_token)
    }
}
