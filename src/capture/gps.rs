//! GPS position from an image's EXIF block.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use super::Locator;
use crate::error::CaptureError;
use crate::store::Coordinates;

/// Locates a photo by the GPS tags its camera embedded.
pub struct ExifLocator {
    path: PathBuf,
}

impl ExifLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Locator for ExifLocator {
    fn acquire_coordinates(&self) -> Result<Coordinates, CaptureError> {
        let unavailable =
            |reason: String| CaptureError::LocationUnavailable(format!("{}: {}", self.path.display(), reason));

        let file = File::open(&self.path).map_err(|e| unavailable(e.to_string()))?;
        let mut bufreader = BufReader::new(file);
        let exif = exif::Reader::new()
            .read_from_container(&mut bufreader)
            .map_err(|e| unavailable(e.to_string()))?;

        let field = |tag| exif.get_field(tag, exif::In::PRIMARY);
        let (Some(lat_field), Some(lat_ref), Some(lon_field), Some(lon_ref)) = (
            field(exif::Tag::GPSLatitude),
            field(exif::Tag::GPSLatitudeRef),
            field(exif::Tag::GPSLongitude),
            field(exif::Tag::GPSLongitudeRef),
        ) else {
            return Err(unavailable("no GPS tags".to_string()));
        };

        let (exif::Value::Rational(lat_vals), exif::Value::Rational(lon_vals)) =
            (&lat_field.value, &lon_field.value)
        else {
            return Err(unavailable("GPS tags are not rationals".to_string()));
        };

        gps_to_coordinates(
            lat_vals,
            &lat_ref.display_value().to_string(),
            lon_vals,
            &lon_ref.display_value().to_string(),
        )
        .ok_or_else(|| unavailable("malformed GPS tags".to_string()))
    }
}

fn gps_to_coordinates(
    lat: &[exif::Rational],
    lat_ref: &str,
    lon: &[exif::Rational],
    lon_ref: &str,
) -> Option<Coordinates> {
    let latitude = dms_to_decimal(lat)?;
    let longitude = dms_to_decimal(lon)?;
    Some(Coordinates::new(
        if lat_ref.contains('S') { -latitude } else { latitude },
        if lon_ref.contains('W') { -longitude } else { longitude },
    ))
}

fn dms_to_decimal(dms: &[exif::Rational]) -> Option<f64> {
    if dms.len() < 3 || dms.iter().take(3).any(|r| r.denom == 0) {
        return None;
    }
    let part = |r: &exif::Rational| r.num as f64 / r.denom as f64;
    Some(part(&dms[0]) + part(&dms[1]) / 60.0 + part(&dms[2]) / 3600.0)
}
