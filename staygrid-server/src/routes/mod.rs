pub mod grid;
pub mod properties;
pub mod sources;
pub mod timelines;

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use staygrid_core::StayGridError;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// JSON body extractor whose rejections answer with an [`ErrorResponse`].
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections answer with an [`ErrorResponse`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Convert errors to HTTP responses. Invalid caller input (including a
/// body or query that does not parse) is a 400, everything else a 500.
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(e) = self.0.downcast_ref::<StayGridError>() {
            return if e.is_invalid_input() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
        }
        if self.0.is::<JsonRejection>() || self.0.is::<QueryRejection>() {
            return StatusCode::BAD_REQUEST;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use staygrid_core::{
        Aggregator, HttpFetcher, JsonMappingStore, OccupancyPolicy, TimelineStore,
    };
    use tower::ServiceExt;

    use crate::state::AppState;

    /// App with no feeds and mappings in a temp dir.
    pub fn test_app() -> (Router, AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = Aggregator::new(
            HttpFetcher::new(Duration::from_secs(1)).unwrap(),
            JsonMappingStore::new(dir.path()),
            Arc::new(TimelineStore::new()),
            Vec::new(),
        )
        .unwrap();
        let state = AppState::with_aggregator(Arc::new(aggregator), OccupancyPolicy::default());
        (crate::app(state.clone()), state, dir)
    }

    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }
}
