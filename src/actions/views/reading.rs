use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::readings::Reading;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingView {
    pub id: i32,
    pub recorded_at: DateTime<Utc>,
    /// Stored `"{lat},{lon}"` pair
    pub coordinates: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub device_id: i32,
}

impl From<Reading> for ReadingView {
    fn from(reading: Reading) -> Self {
        let coordinate = reading.coordinate();
        Self {
            id: reading.id,
            recorded_at: reading.recorded_at,
            coordinates: reading.coordinates,
            latitude: coordinate.map(|c| c.latitude()),
            longitude: coordinate.map(|c| c.longitude()),
            device_id: reading.device_id,
        }
    }
}

/// A position report sent by a device
#[derive(Debug, Deserialize)]
pub struct CreateReadingRequest {
    pub mac: String,
    /// Raw GNSS sentence as returned by the modem
    #[serde(default, alias = "coordenadas")]
    pub coordinates: Option<String>,
}
