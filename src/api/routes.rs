use axum::{
    routing::{get, post},
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{AppError, ExtractionError, GENERIC_FAILURE};
use crate::api::models::{ExtractRequest, QuoteRequest};
use crate::api::response;
use crate::pricing::{self, Margin};
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/extract", post(extract_handler))
        .route("/quote", post(quote_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn extract_handler(
    State(state): State<AppState>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "rejected extraction request body");
            return response::error(StatusCode::BAD_REQUEST, GENERIC_FAILURE).into_response();
        }
    };

    // A missing url is validated like an empty one
    let url = req.url.unwrap_or_default();
    info!(%url, "processing extraction request");
    let start_time = Instant::now();

    // Bound the whole attempt, not just the fetch
    let result = tokio::time::timeout(
        state.config.request_timeout,
        state.extractor.extract(&url),
    )
    .await;

    let elapsed = start_time.elapsed();

    match result {
        Ok(Ok(product)) => {
            info!(%url, ?elapsed, "extraction succeeded");
            response::success(product).into_response()
        }
        Ok(Err(err)) => {
            warn!(%url, ?elapsed, error = %err, "extraction failed");
            err.into_response()
        }
        Err(_) => {
            warn!(%url, ?elapsed, "extraction timed out");
            ExtractionError::FetchFailed("request timed out".to_string()).into_response()
        }
    }
}

async fn quote_handler(
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!(error = %rejection, "rejected quote request body");
        AppError::InvalidQuote(rejection.body_text())
    })?;

    let margin = match req.margin_percent {
        Some(percent) => Margin::new(percent)?,
        None => Margin::default(),
    };

    let quote = pricing::quote(req.price, margin, &req.images)?;
    info!(
        price = quote.price,
        margin = quote.margin_percent,
        selling_price = quote.selling_price,
        "quote computed"
    );

    Ok(response::success(quote).into_response())
}
