use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::devices::{DeviceChanges, MacAddress, NewDevice};
use crate::store::Conflict;
use crate::web::AppState;

use super::views::{CreateDeviceRequest, ReadingView, UpdateDeviceRequest};
use super::{LimitParams, json_error, json_message};

pub async fn get_all_devices(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.stores.devices.list_devices().await {
        Ok(devices) => Json(devices).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to get devices");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get devices").into_response()
        }
    }
}

pub async fn create_device_for_user(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<CreateDeviceRequest>,
) -> impl IntoResponse {
    let mac: MacAddress = match payload.mac.parse() {
        Ok(mac) => mac,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response(),
    };

    match state.stores.users.get_user_by_id(user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to look up device owner");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create device")
                .into_response();
        }
    }

    match state.stores.devices.get_device_by_mac(mac.as_str()).await {
        Ok(Some(_)) => {
            return json_error(StatusCode::CONFLICT, &Conflict::Mac.to_string())
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check device MAC");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create device")
                .into_response();
        }
    }

    let new_device = NewDevice::new(mac, payload.name, payload.active, user_id);
    match state.stores.devices.create_device(new_device).await {
        Ok(device) => {
            info!(device_id = device.id, user_id, "Registered device {}", device.mac);
            (StatusCode::CREATED, Json(device)).into_response()
        }
        Err(e) => match Conflict::of(&e) {
            Some(conflict) => json_error(StatusCode::CONFLICT, &conflict.to_string()).into_response(),
            None => {
                error!(error = %e, "Failed to create device");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create device")
                    .into_response()
            }
        },
    }
}

pub async fn get_device_by_id(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(device_id): Path<i32>,
) -> impl IntoResponse {
    match state.stores.devices.get_device_by_id(device_id).await {
        Ok(Some(device)) => Json(device).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Device not found").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to get device");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get device").into_response()
        }
    }
}

pub async fn get_devices_by_user(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> impl IntoResponse {
    match state.stores.devices.list_devices_for_user(user_id).await {
        Ok(devices) if devices.is_empty() => {
            json_error(StatusCode::NOT_FOUND, "No devices found for this user").into_response()
        }
        Ok(devices) => Json(devices).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to get devices for user");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get devices").into_response()
        }
    }
}

pub async fn update_device_by_id(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(device_id): Path<i32>,
    Json(payload): Json<UpdateDeviceRequest>,
) -> impl IntoResponse {
    let mac = match payload.mac.as_deref().map(str::parse::<MacAddress>) {
        Some(Ok(mac)) => Some(mac),
        Some(Err(e)) => {
            return json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response();
        }
        None => None,
    };

    if let Some(mac) = &mac {
        match state.stores.devices.get_device_by_mac(mac.as_str()).await {
            Ok(Some(other)) if other.id != device_id => {
                return json_error(StatusCode::CONFLICT, &Conflict::Mac.to_string())
                    .into_response();
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "Failed to check device MAC");
                return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update device")
                    .into_response();
            }
        }
    }

    let changes = DeviceChanges {
        mac: mac.map(MacAddress::into_inner),
        name: payload.name,
        active: payload.active,
    };
    match state.stores.devices.update_device(device_id, changes).await {
        Ok(Some(device)) => Json(device).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Device not found").into_response(),
        Err(e) => match Conflict::of(&e) {
            Some(conflict) => json_error(StatusCode::CONFLICT, &conflict.to_string()).into_response(),
            None => {
                error!(error = %e, "Failed to update device");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update device")
                    .into_response()
            }
        },
    }
}

pub async fn delete_device_by_id(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(device_id): Path<i32>,
) -> impl IntoResponse {
    match state.stores.devices.delete_device(device_id).await {
        Ok(true) => json_message("Device deleted").into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Device not found").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to delete device");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete device")
                .into_response()
        }
    }
}

pub async fn get_device_readings(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(device_id): Path<i32>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    match state.stores.devices.get_device_by_id(device_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Device not found").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to get device");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get readings")
                .into_response();
        }
    }

    match state
        .stores
        .readings
        .list_readings_for_device(device_id, params.limit())
        .await
    {
        Ok(readings) => {
            let views: Vec<ReadingView> = readings.into_iter().map(ReadingView::from).collect();
            Json(views).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to get readings for device");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get readings")
                .into_response()
        }
    }
}
