use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: String,
    pub user_id: i32,
}

impl TokenResponse {
    pub fn bearer(access_token: String, role: String, user_id: i32) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            role,
            user_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UsernameLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailLoginRequest {
    pub email: String,
    pub password: String,
}
