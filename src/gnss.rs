//! GNSS position decoding.
//!
//! Devices report their position as the raw response of a cellular modem's GNSS
//! query, e.g. `+CGPSINFO: 2237.7749,N,11422.4194,W,061125,063100.0,88.1,0.0,`.
//! Latitude and longitude are encoded as DMM (degrees followed by decimal
//! minutes) with fixed-width degree digits: two for latitude, three for
//! longitude.
//!
//! [`decode`] turns such a sentence into signed decimal degrees. It is a pure
//! function: no state, no I/O, and every failure is reported as
//! [`DecodeError::MalformedSentence`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Number of leading characters holding the degrees of a latitude field.
const LATITUDE_DEGREE_DIGITS: usize = 2;
/// Number of leading characters holding the degrees of a longitude field.
const LONGITUDE_DEGREE_DIGITS: usize = 3;
/// Latitude, N/S, longitude, E/W.
const POSITION_FIELDS: usize = 4;

/// Vendor tag such as `+CGPSINFO:` followed by optional whitespace.
/// The tag has to start with a letter (after an optional symbol), so a sentence
/// that begins with digits is never touched.
static VENDOR_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^0-9A-Za-z\s,]?[A-Za-z][A-Za-z0-9_]*:\s*").unwrap());

/// Why a sentence could not be decoded. Diagnostic only; callers treat every
/// reason the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Fewer than four comma-separated fields after the vendor tag
    TooFewFields,
    /// The degree digits of a coordinate field are not an integer
    InvalidDegrees,
    /// The minutes part of a coordinate field is missing or not a finite number
    InvalidMinutes,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::TooFewFields => write!(f, "too few fields"),
            MalformedReason::InvalidDegrees => write!(f, "invalid degrees"),
            MalformedReason::InvalidMinutes => write!(f, "invalid minutes"),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed GNSS sentence: {0}")]
    MalformedSentence(MalformedReason),
}

/// A position in signed decimal degrees.
///
/// Values are not range-checked. The persisted form is the `Display`
/// output, `"{latitude},{longitude}"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedCoordinate {
    latitude: f64,
    longitude: f64,
}

impl DecodedCoordinate {
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Parse the persisted `"{lat},{lon}"` representation back into a coordinate.
    pub fn from_stored(stored: &str) -> Option<Self> {
        let (lat, lon) = stored.split_once(',')?;
        Some(Self {
            latitude: lat.trim().parse().ok()?,
            longitude: lon.trim().parse().ok()?,
        })
    }
}

/// Whole degrees keep their fraction (`-74.0`, not `-74`) so stored readings
/// always carry two decimal numbers.
impl fmt::Display for DecodedCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?},{:?}", self.latitude, self.longitude)
    }
}

/// Decode a raw GNSS sentence into decimal degrees.
pub fn decode(raw: &str) -> Result<DecodedCoordinate, DecodeError> {
    let sentence = strip_vendor_tag(raw);

    let fields: Vec<&str> = sentence
        .split(',')
        .take(POSITION_FIELDS)
        .map(str::trim)
        .collect();
    let [lat_dmm, ns, lon_dmm, ew] = fields[..] else {
        return Err(DecodeError::MalformedSentence(MalformedReason::TooFewFields));
    };

    let latitude = dmm_to_degrees(lat_dmm, LATITUDE_DEGREE_DIGITS)?;
    let longitude = dmm_to_degrees(lon_dmm, LONGITUDE_DEGREE_DIGITS)?;

    Ok(DecodedCoordinate {
        latitude: if ns == "S" { -latitude } else { latitude },
        longitude: if ew == "W" { -longitude } else { longitude },
    })
}

/// True for the exact hemisphere letters `N`, `S`, `E` and `W`.
pub fn is_known_hemisphere(indicator: &str) -> bool {
    matches!(indicator, "N" | "S" | "E" | "W")
}

/// The two hemisphere indicators of a sentence, if it has them.
/// Used by callers that want to warn about indicators [`decode`] ignores.
pub fn hemisphere_indicators(raw: &str) -> Option<(&str, &str)> {
    let mut fields = strip_vendor_tag(raw).split(',').map(str::trim);
    let ns = fields.nth(1)?;
    let ew = fields.nth(1)?;
    Some((ns, ew))
}

fn strip_vendor_tag(raw: &str) -> &str {
    match VENDOR_TAG_RE.find(raw) {
        Some(tag) => &raw[tag.end()..],
        None => raw,
    }
}

/// Convert a fixed-width DMM field (`DDMM.MMMM` / `DDDMM.MMMM`) to degrees.
fn dmm_to_degrees(field: &str, degree_digits: usize) -> Result<f64, DecodeError> {
    // Split on a character boundary so multi-byte input cannot panic
    let split_at = field
        .char_indices()
        .nth(degree_digits)
        .map_or(field.len(), |(idx, _)| idx);
    let (degrees, minutes) = field.split_at(split_at);

    // Padding inside the fixed-width field (`"2 37.7749"`) is tolerated
    let degrees: i32 = degrees
        .trim()
        .parse()
        .map_err(|_| DecodeError::MalformedSentence(MalformedReason::InvalidDegrees))?;
    let minutes: f64 = minutes
        .trim()
        .parse()
        .ok()
        .filter(|m: &f64| m.is_finite())
        .ok_or(DecodeError::MalformedSentence(MalformedReason::InvalidMinutes))?;

    Ok(f64::from(degrees) + minutes / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn malformed(reason: MalformedReason) -> Result<DecodedCoordinate, DecodeError> {
        Err(DecodeError::MalformedSentence(reason))
    }

    #[test]
    fn test_decode_canonical_sentence() {
        let coord = decode("2237.7749,N,11422.4194,W").unwrap();
        // 22 + 37.7749 / 60, 114 + 22.4194 / 60
        assert!((coord.latitude() - 22.629_581_666).abs() < EPSILON);
        assert!((coord.longitude() + 114.373_656_666).abs() < EPSILON);
    }

    #[test]
    fn test_decode_is_deterministic() {
        for input in [
            "2237.7749,N,11422.4194,W",
            "",
            "4024.0000,S",
            "+CGPSINFO: 4024.0000,S,07400.0000,E,,,",
        ] {
            assert_eq!(decode(input), decode(input));
        }
    }

    #[test]
    fn test_vendor_prefix_is_stripped() {
        let bare = decode("2237.7749,N,11422.4194,W").unwrap();
        assert_eq!(decode("+CGPSINFO:2237.7749,N,11422.4194,W").unwrap(), bare);
        assert_eq!(decode("+CGPSINFO: 2237.7749,N,11422.4194,W").unwrap(), bare);
    }

    #[test]
    fn test_prefix_stripping_keeps_numeric_data() {
        // Nothing that looks like a tag here; the sentence must decode as-is
        let coord = decode("4024.0000,N,07400.0000,E").unwrap();
        assert!((coord.latitude() - 40.4).abs() < EPSILON);
        assert!((coord.longitude() - 74.0).abs() < EPSILON);
        assert_eq!(strip_vendor_tag("4024.0000,N"), "4024.0000,N");
        assert_eq!(strip_vendor_tag("12:30,N"), "12:30,N");
    }

    #[test]
    fn test_southern_hemisphere_is_negative() {
        let coord = decode("4024.0000,S,07400.0000,E").unwrap();
        assert!(coord.latitude() < 0.0);
        assert!(coord.longitude() >= 0.0);
        assert!((coord.latitude() + 40.4).abs() < EPSILON);
    }

    #[test]
    fn test_lowercase_hemisphere_is_not_negated() {
        let coord = decode("4024.0000,s,07400.0000,w").unwrap();
        assert!(coord.latitude() > 0.0);
        assert!(coord.longitude() > 0.0);
    }

    #[test]
    fn test_too_few_fields() {
        assert_eq!(decode("4024.0000,S"), malformed(MalformedReason::TooFewFields));
        assert_eq!(
            decode("4024.0000,S,07400.0000"),
            malformed(MalformedReason::TooFewFields)
        );
    }

    #[test]
    fn test_non_numeric_field() {
        assert_eq!(
            decode("ABCD.EFGH,N,11422.4194,W"),
            malformed(MalformedReason::InvalidDegrees)
        );
        assert_eq!(
            decode("22AB.CDEF,N,11422.4194,W"),
            malformed(MalformedReason::InvalidMinutes)
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decode(""), malformed(MalformedReason::TooFewFields));
        assert_eq!(decode("+CGPSINFO:"), malformed(MalformedReason::TooFewFields));
    }

    #[test]
    fn test_empty_fields_from_modem_without_fix() {
        // Modems answer with empty fields while they have no fix
        assert!(decode("+CGPSINFO: ,,,,,,,,").is_err());
    }

    #[test]
    fn test_field_too_short_to_slice() {
        assert_eq!(
            decode("22,N,11422.4194,W"),
            malformed(MalformedReason::InvalidMinutes)
        );
        assert_eq!(
            decode("2,N,11422.4194,W"),
            malformed(MalformedReason::InvalidMinutes)
        );
    }

    #[test]
    fn test_multibyte_input_does_not_panic() {
        assert!(decode("2°37.7749,N,11422.4194,W").is_err());
        assert!(decode("ééé,N,ééé,W").is_err());
    }

    #[test]
    fn test_non_finite_minutes_are_rejected() {
        assert_eq!(
            decode("22inf,N,11422.4194,W"),
            malformed(MalformedReason::InvalidMinutes)
        );
        assert_eq!(
            decode("22NaN,N,11422.4194,W"),
            malformed(MalformedReason::InvalidMinutes)
        );
    }

    #[test]
    fn test_trailing_fields_are_ignored() {
        assert_eq!(
            decode("2237.7749,N,11422.4194,W,0.0,010625").unwrap(),
            decode("2237.7749,N,11422.4194,W").unwrap()
        );
    }

    #[test]
    fn test_whitespace_around_fields_is_trimmed() {
        assert_eq!(
            decode(" 2237.7749 , N , 11422.4194 , W ").unwrap(),
            decode("2237.7749,N,11422.4194,W").unwrap()
        );
    }

    #[test]
    fn test_padding_inside_dmm_field_is_ignored() {
        let coord = decode("2 37.7749,N,114 22.4194,E").unwrap();
        assert!((coord.latitude() - (2.0 + 37.7749 / 60.0)).abs() < EPSILON);
        assert!((coord.longitude() - (114.0 + 22.4194 / 60.0)).abs() < EPSILON);
        assert_eq!(
            decode("   ,N,11422.4194,W"),
            malformed(MalformedReason::InvalidDegrees)
        );
    }

    #[test]
    fn test_display_and_from_stored() {
        let coord = decode("4024.0000,S,07400.0000,W").unwrap();
        let stored = coord.to_string();
        assert_eq!(stored, "-40.4,-74.0");
        assert_eq!(DecodedCoordinate::from_stored(&stored), Some(coord));
        assert_eq!(DecodedCoordinate::from_stored("not a coordinate"), None);
    }

    #[test]
    fn test_hemisphere_indicators() {
        assert_eq!(
            hemisphere_indicators("+CGPSINFO: 2237.7749,n,11422.4194,W,1"),
            Some(("n", "W"))
        );
        assert_eq!(hemisphere_indicators("2237.7749,N"), None);
        assert!(is_known_hemisphere("S"));
        assert!(!is_known_hemisphere("s"));
    }
}
