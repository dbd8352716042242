use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::error;

use crate::auth::AuthUser;
use crate::web::AppState;

use super::json_error;

pub async fn get_roles(_auth_user: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    match state.stores.roles.list_roles().await {
        Ok(roles) => Json(roles).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to get roles");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get roles").into_response()
        }
    }
}
