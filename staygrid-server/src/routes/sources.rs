//! Feed registration

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Deserialize;
use staygrid_core::{FeedSource, Platform};

use crate::routes::{ApiJson, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/sources", post(register_source))
}

/// Request body for registering a feed
#[derive(Deserialize)]
pub struct RegisterSourceRequest {
    pub url: String,
    /// Defaults to the next free `logement-<n>` key
    pub property_key: Option<String>,
    /// `airbnb` or `booking`, defaults to airbnb
    pub platform: Option<String>,
}

/// POST /sources - Register (or replace) a property's feed for one platform
async fn register_source(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterSourceRequest>,
) -> Result<(StatusCode, Json<FeedSource>), AppError> {
    let aggregator = state.aggregator();

    let platform = match req.platform.as_deref() {
        Some(name) => name.parse::<Platform>()?,
        None => Platform::default(),
    };
    let property_key = req
        .property_key
        .filter(|key| !key.trim().is_empty())
        .unwrap_or_else(|| aggregator.next_property_key());

    let source = aggregator
        .register_feed(&property_key, platform, &req.url)
        .await?;
    Ok((StatusCode::CREATED, Json(source)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{send, test_app};

    #[tokio::test]
    async fn rejects_invalid_registrations() {
        let (app, state, _dir) = test_app();

        let (status, _) = send(&app, "POST", "/sources", Some(json!({ "url": "not a url" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "POST",
            "/sources",
            Some(json!({ "url": "https://a.test/ical/1.ics", "platform": "vrbo" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("vrbo"));

        assert!(state.aggregator().feeds().is_empty());
    }

    #[tokio::test]
    async fn malformed_bodies_are_json_bad_requests() {
        let (app, state, _dir) = test_app();

        let (status, body) = send(&app, "POST", "/sources", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("url"));

        let (status, body) = send(&app, "POST", "/sources", Some(json!({ "url": 42 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        // No JSON content type at all
        let (status, body) = send(&app, "POST", "/sources", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        assert!(state.aggregator().feeds().is_empty());
    }

    #[tokio::test]
    async fn unreachable_feed_still_registers_its_property() {
        let (app, state, _dir) = test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/sources",
            Some(json!({ "url": "http://127.0.0.1:9/ical/77.ics" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["property_key"], "logement-1");
        assert_eq!(body["platform"], "airbnb");

        let snapshot = state.aggregator().timelines();
        let timeline = snapshot.timeline("logement-1").unwrap();
        assert_eq!(timeline.display_name, "Logement AIRBNB - 77");
        assert!(timeline.events.is_empty());
    }
}
