use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::ingest::record_reading;
use crate::web::AppState;

use super::views::{CreateReadingRequest, ReadingView};
use super::{LimitParams, json_error};

pub async fn get_readings(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    match state.stores.readings.list_readings(params.limit()).await {
        Ok(readings) => {
            let views: Vec<ReadingView> = readings.into_iter().map(ReadingView::from).collect();
            Json(views).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to get readings");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get readings")
                .into_response()
        }
    }
}

/// Devices post their position here without a token; the MAC identifies them.
pub async fn create_reading(
    State(state): State<AppState>,
    Json(payload): Json<CreateReadingRequest>,
) -> impl IntoResponse {
    match record_reading(
        state.stores.devices.as_ref(),
        state.stores.readings.as_ref(),
        &payload.mac,
        payload.coordinates.as_deref(),
    )
    .await
    {
        Ok(reading) => {
            info!(
                device_id = reading.device_id,
                reading_id = reading.id,
                "Stored reading {}",
                reading.coordinates
            );
            (StatusCode::CREATED, Json(ReadingView::from(reading))).into_response()
        }
        Err(e) => e.into_response(),
    }
}
