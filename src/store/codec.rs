//! Text encoding of photo records.
//!
//! Three generations of values can be found in a medium:
//!
//! - version 0: the image URI as a bare string;
//! - version 1: `{"uri", "location", "date"}` without a version tag;
//! - version 2: the version 1 fields plus `"schemaVersion": 2`.
//!
//! Writes always produce the current version. Reads dispatch on the version
//! tag and fall back to version 0 for anything that is not an object with a
//! string `uri`, so no stored value is ever lost.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::record::{Coordinates, NewPhoto, PhotoRecord};

pub const SCHEMA_VERSION: u64 = 2;

#[derive(Serialize)]
struct StoredPhoto<'a> {
    #[serde(rename = "schemaVersion")]
    schema_version: u64,
    uri: &'a str,
    location: Option<Coordinates>,
    date: Option<String>,
}

pub fn encode(photo: &NewPhoto) -> serde_json::Result<String> {
    serde_json::to_string(&StoredPhoto {
        schema_version: SCHEMA_VERSION,
        uri: &photo.image_uri,
        location: photo.location,
        date: photo
            .captured_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    })
}

pub fn decode(key: &str, raw: &str) -> PhotoRecord {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!(key, error = %e, "Entry is not JSON, reading it as a bare uri");
            return decode_v0(key, raw);
        }
    };

    let Some(object) = value.as_object() else {
        debug!(key, "Entry is not an object, reading it as a bare uri");
        return decode_v0(key, raw);
    };

    let Some(uri) = object.get("uri").and_then(Value::as_str) else {
        debug!(key, "Entry has no string uri, reading it as a bare uri");
        return decode_v0(key, raw);
    };

    match object.get("schemaVersion").and_then(Value::as_u64) {
        Some(SCHEMA_VERSION) => decode_v2(key, uri, object),
        Some(version) => {
            debug!(key, version, "Unknown schema version, decoding as version 1");
            decode_v1(key, uri, object)
        }
        None => decode_v1(key, uri, object),
    }
}

fn decode_v0(key: &str, raw: &str) -> PhotoRecord {
    PhotoRecord {
        key: key.to_string(),
        image_uri: raw.to_string(),
        location: None,
        captured_at: None,
    }
}

fn decode_v1(key: &str, uri: &str, object: &Map<String, Value>) -> PhotoRecord {
    PhotoRecord {
        key: key.to_string(),
        image_uri: uri.to_string(),
        location: object.get("location").and_then(parse_location),
        captured_at: object
            .get("date")
            .and_then(Value::as_str)
            .and_then(parse_loose_timestamp),
    }
}

fn decode_v2(key: &str, uri: &str, object: &Map<String, Value>) -> PhotoRecord {
    PhotoRecord {
        key: key.to_string(),
        image_uri: uri.to_string(),
        location: object.get("location").and_then(parse_location),
        captured_at: object
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|at| at.with_timezone(&Utc)),
    }
}

fn parse_location(value: &Value) -> Option<Coordinates> {
    let latitude = value.get("latitude")?.as_f64()?;
    let longitude = value.get("longitude")?.as_f64()?;
    Some(Coordinates::new(latitude, longitude))
}

/// Version 1 dates came from several writers; accept RFC 3339 and a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC.
fn parse_loose_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
