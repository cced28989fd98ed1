//! Occupancy grid endpoint

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use staygrid_core::{DateWindow, Grid, project};

use crate::routes::{ApiQuery, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/grid", get(get_grid))
}

#[derive(Debug, Default, Deserialize)]
pub struct GridQuery {
    /// First day (YYYY-MM-DD), defaults to today
    pub start: Option<NaiveDate>,
    pub days: Option<u32>,
    /// Whole windows to move by; negative goes back
    #[serde(default)]
    pub page: i64,
}

/// GET /grid?start=&days=&page= - Project the current timelines onto a window
async fn get_grid(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GridQuery>,
) -> Result<Json<Grid>, AppError> {
    let window = DateWindow::resolve(query.start, query.days, query.page)?;
    let snapshot = state.aggregator().timelines();
    Ok(Json(project(snapshot.iter(), window, state.policy())))
}
