//! Property display names and cleaning vendors

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use staygrid_core::{CleaningOffset, VendorAssignment};

use crate::routes::{ApiJson, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/properties", post(rename_property))
        .route("/vendors", post(assign_vendor))
}

#[derive(Deserialize)]
pub struct RenameRequest {
    pub property_key: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct RenameResponse {
    pub property_key: String,
    pub display_name: String,
}

/// POST /properties - Set a property's display name
async fn rename_property(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RenameRequest>,
) -> Result<Json<RenameResponse>, AppError> {
    let aggregator = state.aggregator();
    aggregator.set_display_name(&req.property_key, &req.name).await?;

    let property_key = req.property_key.trim().to_string();
    let display_name = aggregator
        .names()
        .get(&property_key)
        .cloned()
        .unwrap_or_default();
    Ok(Json(RenameResponse {
        property_key,
        display_name,
    }))
}

#[derive(Deserialize)]
pub struct AssignVendorRequest {
    pub property_key: String,
    pub vendor: String,
    /// Delay after checkout, e.g. "3h" or "1d"
    pub offset: Option<String>,
}

/// POST /vendors - Assign the cleaning vendor of a property
async fn assign_vendor(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AssignVendorRequest>,
) -> Result<Json<VendorAssignment>, AppError> {
    let offset = match req.offset.as_deref() {
        Some(raw) => CleaningOffset::parse(raw)?,
        None => CleaningOffset::zero(),
    };

    let aggregator = state.aggregator();
    aggregator.set_vendor(&req.property_key, &req.vendor, offset).await?;

    let assignment = aggregator
        .vendors()
        .get(req.property_key.trim())
        .cloned()
        .unwrap_or_else(|| VendorAssignment::new(req.vendor.trim()).with_offset(offset));
    Ok(Json(assignment))
}
