use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::gnss::DecodedCoordinate;

/// A stored position report. `coordinates` holds the decoder output as `"{lat},{lon}"`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::readings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Reading {
    pub id: i32,
    pub recorded_at: DateTime<Utc>,
    pub coordinates: String,
    pub device_id: i32,
}

impl Reading {
    pub fn coordinate(&self) -> Option<DecodedCoordinate> {
        DecodedCoordinate::from_stored(&self.coordinates)
    }
}

/// Insert model for readings. Only constructible from a decoded coordinate.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::readings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewReading {
    coordinates: String,
    device_id: i32,
}

impl NewReading {
    pub fn new(device_id: i32, coordinate: DecodedCoordinate) -> Self {
        Self {
            coordinates: coordinate.to_string(),
            device_id,
        }
    }

    pub fn coordinates(&self) -> &str {
        &self.coordinates
    }

    pub fn device_id(&self) -> i32 {
        self.device_id
    }
}
