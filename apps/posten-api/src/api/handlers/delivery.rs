use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::delivery::DeliveryDates;
use crate::domain::postal_code::PostalCode;

/// Response for the formatted views
#[derive(Debug, Serialize)]
pub struct DeliveryDaysResponse {
    pub delivery_dates: Vec<String>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses the route segment and runs the lookup
async fn lookup(state: &AppState, segment: &str) -> Result<(NaiveDate, DeliveryDates), ApiError> {
    let code = PostalCode::from_segment(segment).map_err(ApiError::not_found)?;
    let today = today();

    let dates = state
        .delivery
        .lookup(&code, today)
        .await
        .map_err(|failure| ApiError::upstream(&code, failure))?;

    Ok((today, dates))
}

/// Upstream delivery data as-is
///
/// GET /raw/:code
pub async fn delivery_raw(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let (_, dates) = lookup(&state, &segment).await?;
    Ok(Json(dates.payload().clone()))
}

/// Delivery dates as Norwegian text
///
/// GET /text/:code
pub async fn delivery_text(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Json<DeliveryDaysResponse>, ApiError> {
    let (_, dates) = lookup(&state, &segment).await?;
    Ok(Json(DeliveryDaysResponse {
        delivery_dates: dates.as_text(),
    }))
}

/// Delivery dates relative to today
///
/// GET /next/:code
pub async fn delivery_next(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Json<DeliveryDaysResponse>, ApiError> {
    let (today, dates) = lookup(&state, &segment).await?;
    Ok(Json(DeliveryDaysResponse {
        delivery_dates: dates.relative_to(today),
    }))
}
