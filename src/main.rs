use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bluberry_api::ebay::{EbayClient, EbayConfig};
use bluberry_api::images::ImagePreparer;
use bluberry_api::llm::{LlmClient, LlmConfig};
use bluberry_api::models::{ApiError, ListItemRequest, ListItemResponse};
use bluberry_api::pipeline::{ListingError, ListingErrorKind, ListingPipeline};
use bluberry_api::pricing::{self, EstimateRequest, EstimateResponse};
use bluberry_api::security::{AdminAuth, require_admin_key};
use bluberry_api::supabase::SupabaseClient;
use bluberry_api::metrics;
use eyre::eyre;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "bluberry.api", "server crashed: {err}");
    }
}

async fn run() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let supabase = SupabaseClient::from_env()
        .ok_or_else(|| eyre!("SUPABASE_URL and a service key are required"))?;
    let ebay = EbayClient::new(EbayConfig::from_env());
    let bucket =
        std::env::var("SUPABASE_STORAGE_BUCKET").unwrap_or_else(|_| "item-images".to_string());
    let images = ImagePreparer::new(supabase.clone(), bucket);
    let pipeline = ListingPipeline::new(supabase, ebay, images);
    let llm = Arc::new(LlmClient::new(LlmConfig::from_env()));

    let admin_auth = AdminAuth::from_env();
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|err| eyre!("prometheus recorder: {err}"))?;

    let state = AppState {
        pipeline,
        llm,
        prometheus_handle,
    };

    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    let admin = Router::new()
        .route("/api/list-item-on-ebay", post(list_item_on_ebay))
        .route_layer(middleware::from_fn_with_state(admin_auth, require_admin_key));

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/estimate-price", post(estimate_price))
        .merge(admin)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(body_limit_from_env()));

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8000);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!(target = "bluberry.api", "listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    pipeline: ListingPipeline,
    llm: Arc<LlmClient>,
    prometheus_handle: PrometheusHandle,
}

/// Health and readiness check.
///
/// - Method: `GET`
/// - Path: `/health`
/// - Auth: none
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "bluberry-api",
    }))
}

async fn metrics_endpoint(State(state): State<AppState>) -> axum::http::Response<String> {
    let body = state.prometheus_handle.render();
    axum::http::Response::builder()
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .unwrap_or_default()
}

/// Publish one approved submission as a live eBay listing.
///
/// - Method: `POST`
/// - Path: `/api/list-item-on-ebay`
/// - Auth: `X-Admin-Key` or bearer token
/// - Body: `{"id": "<submission id>"}`
async fn list_item_on_ebay(
    State(state): State<AppState>,
    Json(payload): Json<ListItemRequest>,
) -> Result<Json<ListItemResponse>, AppError> {
    metrics::inc_requests("/api/list-item-on-ebay");
    let id = payload
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            AppError(ListingError::new(
                ListingErrorKind::InvalidInput,
                "request",
                "missing submission id",
            ))
        })?
        .to_string();

    let outcome = state.pipeline.run(&id).await?;
    Ok(Json(outcome.into_response()))
}

/// Estimate a resale price for an item being submitted.
///
/// - Method: `POST`
/// - Path: `/api/estimate-price`
/// - Auth: none (called by the intake form)
async fn estimate_price(
    State(state): State<AppState>,
    Json(payload): Json<EstimateRequest>,
) -> Json<EstimateResponse> {
    metrics::inc_requests("/api/estimate-price");
    Json(pricing::estimate(&state.llm, &payload).await)
}

#[derive(Debug)]
struct AppError(ListingError);

impl From<ListingError> for AppError {
    fn from(value: ListingError) -> Self {
        Self(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match err.kind() {
            ListingErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ListingErrorKind::NotFound => StatusCode::NOT_FOUND,
            ListingErrorKind::Conflict => StatusCode::CONFLICT,
            ListingErrorKind::Config
            | ListingErrorKind::Marketplace
            | ListingErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let payload = ApiError {
            error: err.detail().to_string(),
            response: err.response_body().map(|body| body.to_string()),
        };
        (status, Json(payload)).into_response()
    }
}

fn body_limit_from_env() -> usize {
    std::env::var("REQUEST_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(256 * 1024)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
