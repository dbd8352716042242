use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use crate::auth::{AdminUser, AuthUser, hash_password};
use crate::roles;
use crate::store::Conflict;
use crate::users::NewUser;
use crate::web::AppState;

use super::views::{CreateUserRequest, SetRoleRequest, UserView};
use super::{LimitParams, json_error, json_message};

pub async fn get_all_users(
    _admin_user: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    match state.stores.users.list_users(params.limit()).await {
        Ok(users) => {
            let user_views: Vec<UserView> = users.into_iter().map(UserView::from).collect();
            Json(user_views).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to get all users");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get users").into_response()
        }
    }
}

/// Public sign-up. New accounts always get the `user` role.
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> impl IntoResponse {
    let username = payload.username.trim();
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty());

    if username.is_empty() || payload.password.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "Username and password are required",
        )
        .into_response();
    }

    let users = &state.stores.users;
    match users.get_user_by_username(username).await {
        Ok(Some(_)) => {
            return json_error(StatusCode::CONFLICT, &Conflict::Username.to_string())
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check username");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
                .into_response();
        }
    }
    if let Some(email) = email {
        match users.get_user_by_email(email).await {
            Ok(Some(_)) => {
                return json_error(StatusCode::CONFLICT, &Conflict::Email.to_string())
                    .into_response();
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "Failed to check email");
                return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
                    .into_response();
            }
        }
    }

    let role = match state.stores.roles.get_role_by_name(roles::USER).await {
        Ok(Some(role)) => role,
        Ok(None) => {
            error!("Role {} is missing, was the database migrated?", roles::USER);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to look up default role");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
                .into_response();
        }
    };

    let password_hash = match hash_password(&payload.password, state.bcrypt_cost).await {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
                .into_response();
        }
    };

    let new_user = NewUser {
        username: username.to_string(),
        password_hash,
        email: email.map(str::to_string),
        role_id: role.id,
    };
    match users.create_user(new_user).await {
        Ok(user) => {
            info!(user_id = user.id, "Registered user {}", user.username);
            (StatusCode::CREATED, Json(UserView::from(user))).into_response()
        }
        Err(e) => match Conflict::of(&e) {
            Some(conflict) => json_error(StatusCode::CONFLICT, &conflict.to_string()).into_response(),
            None => {
                error!(error = %e, "Failed to create user");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
                    .into_response()
            }
        },
    }
}

pub async fn get_user_by_id(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> impl IntoResponse {
    // Check if user is admin or requesting their own info
    if !auth_user.0.is_admin() && auth_user.0.id != user_id {
        return json_error(StatusCode::FORBIDDEN, "Insufficient permissions").into_response();
    }

    match state.stores.users.get_user_by_id(user_id).await {
        Ok(Some(user)) => Json(UserView::from(user)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to get user");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get user").into_response()
        }
    }
}

pub async fn set_user_role(
    _admin_user: AdminUser,
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<SetRoleRequest>,
) -> impl IntoResponse {
    let role = match state.stores.roles.get_role_by_name(&payload.role).await {
        Ok(Some(role)) => role,
        Ok(None) => return json_error(StatusCode::BAD_REQUEST, "Unknown role").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to look up role");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update user")
                .into_response();
        }
    };

    match state.stores.users.set_user_role(user_id, role.id).await {
        Ok(Some(user)) => {
            info!(user_id, "Changed role to {}", user.role);
            Json(UserView::from(user)).into_response()
        }
        Ok(None) => json_error(StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update user role");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update user").into_response()
        }
    }
}

pub async fn delete_user_by_id(
    _admin_user: AdminUser,
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> impl IntoResponse {
    match state.stores.users.delete_user(user_id).await {
        Ok(true) => json_message("User deleted").into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to delete user");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete user").into_response()
        }
    }
}
