//! Read endpoints over the current snapshot

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use staygrid_core::{Snapshot, TimelineEntry};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reservations", get(list_reservations))
        .route("/timelines", get(get_timelines))
}

/// GET /reservations - Every stay, block and cleaning as one flat list
async fn list_reservations(State(state): State<AppState>) -> Json<Vec<TimelineEntry>> {
    let snapshot = state.aggregator().timelines();
    let entries = snapshot
        .iter()
        .flat_map(|timeline| timeline.entries())
        .collect();
    Json(entries)
}

/// GET /timelines - The latest published snapshot
async fn get_timelines(State(state): State<AppState>) -> Json<Arc<Snapshot>> {
    Json(state.aggregator().timelines())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{send, test_app};

    #[tokio::test]
    async fn empty_service_serves_empty_snapshot() {
        let (app, _state, _dir) = test_app();

        let (status, body) = send(&app, "GET", "/timelines", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], 0);
        assert!(body["timelines"].as_object().unwrap().is_empty());

        let (status, body) = send(&app, "GET", "/reservations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }
}
