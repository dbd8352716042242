use chrono::{DateTime, Utc};
use diesel::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Six hex octets separated by `:` or `-`
static MAC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{2}([:-][0-9A-Fa-f]{2}){5}$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid MAC address: {0}")]
pub struct InvalidMacAddress(pub String);

/// A hardware address in canonical form: upper-case hex octets joined by colons,
/// e.g. `00:11:22:AA:BB:CC`. Devices are stored and looked up by this form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = InvalidMacAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !MAC_RE.is_match(trimmed) {
            return Err(InvalidMacAddress(s.to_string()));
        }
        Ok(MacAddress(trimmed.replace('-', ":").to_ascii_uppercase()))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Diesel model for the devices table, also used as the API model
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::devices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Device {
    pub id: i32,
    pub mac: String,
    pub name: Option<String>,
    pub active: bool,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::devices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDevice {
    pub mac: String,
    pub name: Option<String>,
    pub active: bool,
    pub user_id: i32,
}

impl NewDevice {
    pub fn new(mac: MacAddress, name: Option<String>, active: bool, user_id: i32) -> Self {
        Self {
            mac: mac.into_inner(),
            name,
            active,
            user_id,
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = crate::schema::devices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeviceChanges {
    pub mac: Option<String>,
    pub name: Option<String>,
    pub active: Option<bool>,
}

impl DeviceChanges {
    pub fn is_empty(&self) -> bool {
        self.mac.is_none() && self.name.is_none() && self.active.is_none()
    }

    /// Apply the changes to an in-memory device
    pub fn apply_to(&self, device: &mut Device) {
        if let Some(mac) = &self.mac {
            device.mac = mac.clone();
        }
        if let Some(name) = &self.name {
            device.name = Some(name.clone());
        }
        if let Some(active) = self.active {
            device.active = active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_is_normalized() {
        let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(mac.as_str(), "AA:BB:CC:DD:EE:FF");

        let mac: MacAddress = " 00-11-22-33-44-55 ".parse().unwrap();
        assert_eq!(mac.to_string(), "00:11:22:33:44:55");
    }

    #[test]
    fn test_invalid_macs_are_rejected() {
        for input in [
            "INVALID_MAC",
            "",
            "00:11:22:33:44",
            "00:11:22:33:44:55:66",
            "0011.2233.4455",
            "GG:11:22:33:44:55",
        ] {
            assert!(input.parse::<MacAddress>().is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn test_invalid_mac_message() {
        let err = "nope".parse::<MacAddress>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid MAC address: nope");
    }

    #[test]
    fn test_device_changes() {
        let mut device = Device {
            id: 1,
            mac: "00:11:22:33:44:55".to_string(),
            name: Some("Sensor1".to_string()),
            active: true,
            user_id: 1,
            created_at: Utc::now(),
        };

        assert!(DeviceChanges::default().is_empty());

        let changes = DeviceChanges {
            name: Some("Renamed".to_string()),
            active: Some(false),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        changes.apply_to(&mut device);

        assert_eq!(device.name.as_deref(), Some("Renamed"));
        assert!(!device.active);
        assert_eq!(device.mac, "00:11:22:33:44:55");
    }
}
