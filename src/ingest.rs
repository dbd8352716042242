//! Turns a device report (MAC + raw GNSS sentence) into a stored reading.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::actions::json_error;
use crate::devices::MacAddress;
use crate::gnss::{self, DecodeError};
use crate::readings::{NewReading, Reading};
use crate::store::{DeviceRegistry, ReadingStore};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Device not found")]
    DeviceNotFound,

    #[error("GNSS data not provided")]
    MissingGnssData,

    #[error("Invalid or unavailable GNSS data")]
    InvalidGnssData(#[source] DecodeError),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match &self {
            IngestError::DeviceNotFound => StatusCode::NOT_FOUND,
            IngestError::MissingGnssData | IngestError::InvalidGnssData(_) => {
                StatusCode::BAD_REQUEST
            }
            IngestError::Storage(e) => {
                error!(error = %e, "Failed to record reading");
                return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to record reading")
                    .into_response();
            }
        };
        json_error(status, &self.to_string()).into_response()
    }
}

/// Record one position report.
///
/// The device is resolved before the payload is looked at, so an unknown MAC is
/// reported as such even when the payload is also missing. Nothing is stored
/// unless the sentence decodes.
pub async fn record_reading(
    devices: &dyn DeviceRegistry,
    readings: &dyn ReadingStore,
    mac: &str,
    raw: Option<&str>,
) -> Result<Reading, IngestError> {
    // A MAC that cannot be parsed cannot belong to a registered device
    let Ok(mac) = mac.parse::<MacAddress>() else {
        metrics::counter!("readings.device_not_found").increment(1);
        return Err(IngestError::DeviceNotFound);
    };
    let Some(device) = devices.get_device_by_mac(mac.as_str()).await? else {
        metrics::counter!("readings.device_not_found").increment(1);
        return Err(IngestError::DeviceNotFound);
    };

    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(IngestError::MissingGnssData),
    };

    if let Some((ns, ew)) = gnss::hemisphere_indicators(raw)
        && !(gnss::is_known_hemisphere(ns) && gnss::is_known_hemisphere(ew))
    {
        warn!(
            device_id = device.id,
            ns, ew, "Unexpected hemisphere indicator, treating as N/E"
        );
    }

    let coordinate = gnss::decode(raw).map_err(|e| {
        metrics::counter!("readings.decode_failed").increment(1);
        warn!(device_id = device.id, error = %e, "Rejected GNSS sentence");
        IngestError::InvalidGnssData(e)
    })?;

    let reading = readings
        .create_reading(NewReading::new(device.id, coordinate))
        .await?;
    metrics::counter!("readings.created").increment(1);

    Ok(reading)
}
