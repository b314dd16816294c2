//! Local HTTP front door for the search service.
//!
//! Routes:
//! - `POST /api/search/users` - JSON filters in, one mapped result page out
//! - `GET /api/rate-limit` - current search rate-limit bucket
//!
//! Responses are never cacheable. Errors are `{ "error", "code" }` with the
//! status of the underlying failure.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use usersearch::{
    CancelToken, GitHubClient, RateLimitState, SearchError, SearchService, parse_search_request,
};

use crate::config::Config;

const NO_STORE: &str = "no-store, max-age=0";

struct AppState {
    service: SearchService,
    /// Fires on shutdown, aborting in-flight upstream calls.
    cancel: CancelToken,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

/// A [`SearchError`] rendered as a JSON error response.
struct ApiError(SearchError);

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), "Request failed: {}", self.0);
        } else {
            tracing::warn!(code = self.0.code(), "Request rejected: {}", self.0);
        }

        let body = ErrorBody {
            error: self.0.to_string(),
            code: Some(self.0.code()),
        };
        (status, Json(body)).into_response()
    }
}

fn method_not_allowed(allowed: &str) -> Response {
    let body = ErrorBody {
        error: format!("Method not allowed. Use {allowed} instead."),
        code: None,
    };
    (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response()
}

fn no_store_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    headers
}

fn forward_rate_limit(headers: &mut HeaderMap, state: &RateLimitState) {
    for (name, value) in state.to_headers() {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            headers.insert(name, value);
        }
    }
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let filters = parse_search_request(&body)?;
    let outcome = state.service.search(&filters, &state.cancel).await?;

    let mut headers = no_store_headers();
    if let Some(rate_limit) = &outcome.rate_limit {
        forward_rate_limit(&mut headers, rate_limit);
    }
    Ok((StatusCode::OK, headers, Json(outcome.result)).into_response())
}

async fn rate_limit(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let current = state.service.rate_limit(&state.cancel).await?;
    Ok((StatusCode::OK, no_store_headers(), Json(current)).into_response())
}

/// Build the application router.
pub(crate) fn router(service: SearchService, cancel: CancelToken) -> Router {
    let state = Arc::new(AppState { service, cancel });

    Router::new()
        .route(
            "/api/search/users",
            post(search_users).fallback(|| async { method_not_allowed("POST") }),
        )
        .route(
            "/api/rate-limit",
            get(rate_limit).fallback(|| async { method_not_allowed("GET") }),
        )
        .with_state(state)
}

/// Handle the serve command: listen until `cancel` fires.
pub(crate) async fn handle_serve(
    bind: Option<String>,
    config: &Config,
    cancel: CancelToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = GitHubClient::new(config.client_config()?)?;
    let app = router(SearchService::new(client), cancel.clone());

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", bind, e))?;

    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
