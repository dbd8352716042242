use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info};

use crate::auth::{AuthUser, verify_password};
use crate::users::User;
use crate::web::AppState;

use super::{
    json_error,
    views::{EmailLoginRequest, TokenResponse, UserView, UsernameLoginRequest},
};

pub async fn token_by_username(
    State(state): State<AppState>,
    Json(payload): Json<UsernameLoginRequest>,
) -> impl IntoResponse {
    let lookup = state
        .stores
        .users
        .get_user_by_username(&payload.username)
        .await;
    issue_token(&state, lookup, &payload.password).await
}

pub async fn token_by_email(
    State(state): State<AppState>,
    Json(payload): Json<EmailLoginRequest>,
) -> impl IntoResponse {
    let lookup = state.stores.users.get_user_by_email(&payload.email).await;
    issue_token(&state, lookup, &payload.password).await
}

fn invalid_credentials() -> Response {
    metrics::counter!("auth.login.failed").increment(1);
    json_error(StatusCode::UNAUTHORIZED, "Invalid credentials").into_response()
}

/// Check the password of a looked-up user and hand out an access token
async fn issue_token(state: &AppState, lookup: Result<Option<User>>, password: &str) -> Response {
    let user = match lookup {
        Ok(Some(user)) => user,
        Ok(None) => return invalid_credentials(),
        Err(e) => {
            error!(error = %e, "Failed to look up user for login");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to log in")
                .into_response();
        }
    };

    match verify_password(password, &user.password_hash).await {
        Ok(true) => {}
        Ok(false) => return invalid_credentials(),
        Err(e) => {
            error!(error = %e, "Failed to verify password");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to log in")
                .into_response();
        }
    }

    match state.jwt.generate_token(&user) {
        Ok(token) => {
            metrics::counter!("auth.login.succeeded").increment(1);
            info!(user_id = user.id, "User logged in");
            Json(TokenResponse::bearer(token, user.role, user.id)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to generate token");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate authentication token",
            )
            .into_response()
        }
    }
}

pub async fn get_current_user(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(UserView::from(user))
}
