pub mod auth;
pub mod devices;
pub mod readings;
pub mod roles;
pub mod users;
pub mod views;

pub use auth::*;
pub use devices::*;
pub use readings::*;
pub use roles::*;
pub use users::*;

use axum::{Json, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

/// Error body used by every endpoint: `{"detail": "<message>"}`
pub fn json_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": message })))
}

pub(crate) fn json_message(message: &str) -> Json<Value> {
    Json(json!({ "message": message }))
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

impl LimitParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(LimitParams::default().limit(), DEFAULT_LIMIT);
        assert_eq!(LimitParams { limit: Some(0) }.limit(), 1);
        assert_eq!(LimitParams { limit: Some(5) }.limit(), 5);
        assert_eq!(LimitParams { limit: Some(1_000_000) }.limit(), MAX_LIMIT);
    }
}
