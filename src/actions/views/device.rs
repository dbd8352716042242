use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateDeviceRequest {
    pub mac: String,
    pub name: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDeviceRequest {
    pub mac: Option<String>,
    pub name: Option<String>,
    pub active: Option<bool>,
}
