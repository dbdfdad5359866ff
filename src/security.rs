use crate::models::ApiError;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{self, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{convert::Infallible, env, sync::Arc};
use tracing::warn;

/// Gate for the dashboard-facing endpoints. The admin surface presents one
/// shared key via `X-Admin-Key` or a bearer token.
#[derive(Clone)]
pub struct AdminAuth {
    key: Arc<String>,
}

impl AdminAuth {
    pub fn from_env() -> Self {
        let key = env::var("ADMIN_API_KEY").unwrap_or_default();
        if key.is_empty() {
            warn!(
                target = "bluberry.api",
                "ADMIN_API_KEY is not set; admin endpoints are open"
            );
        }
        Self { key: Arc::new(key) }
    }

    fn allows(&self, presented: Option<&str>) -> bool {
        if self.key.is_empty() {
            return true;
        }
        presented == Some(self.key.as_str())
    }
}

pub async fn require_admin_key(
    State(auth): State<AdminAuth>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, Infallible> {
    let presented = extract_key(request.headers());
    if auth.allows(presented.as_deref()) {
        Ok(next.run(request).await)
    } else {
        let payload = ApiError {
            error: "unauthorized".to_string(),
            response: None,
        };
        Ok((StatusCode::UNAUTHORIZED, Json(payload)).into_response())
    }
}

fn extract_key(headers: &http::HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(http::header::AUTHORIZATION)
        && let Ok(raw) = value.to_str()
        && raw.len() >= 7
        && raw[..6].eq_ignore_ascii_case("bearer")
    {
        return Some(raw[6..].trim().to_string());
    }
    headers
        .get("X-Admin-Key")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
