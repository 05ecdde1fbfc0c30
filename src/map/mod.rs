//! Map view: located photos as pins around the user's position.

use tracing::warn;

use crate::capture::Locator;
use crate::config::MapConfig;
use crate::error::CaptureError;
use crate::store::{Coordinates, PhotoRecord};

pub const CURRENT_LOCATION_KEY: &str = "current_location";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    pub fn around(center: Coordinates, config: &MapConfig) -> Self {
        Self {
            latitude: center.latitude,
            longitude: center.longitude,
            latitude_delta: config.latitude_delta,
            longitude_delta: config.longitude_delta,
        }
    }

    pub fn contains(&self, point: Coordinates) -> bool {
        (point.latitude - self.latitude).abs() <= self.latitude_delta / 2.0
            && (point.longitude - self.longitude).abs() <= self.longitude_delta / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub key: String,
    pub title: &'static str,
    pub coordinate: Coordinates,
    /// Photo shown in the marker's callout; `None` for the user's own pin.
    pub image_uri: Option<String>,
    pub callout: Option<&'static str>,
}

/// One marker per record that carries a location.
pub fn photo_markers(records: &[PhotoRecord]) -> Vec<MapMarker> {
    records
        .iter()
        .filter_map(|record| {
            record.location.map(|coordinate| MapMarker {
                key: record.key.clone(),
                title: "Photo",
                coordinate,
                image_uri: Some(record.image_uri.clone()),
                callout: Some("Photo taken at this location"),
            })
        })
        .collect()
}

pub fn current_location_marker(position: Coordinates) -> MapMarker {
    MapMarker {
        key: CURRENT_LOCATION_KEY.to_string(),
        title: "My Location",
        coordinate: position,
        image_uri: None,
        callout: None,
    }
}

/// Payload handed to the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub message: String,
    pub url: String,
}

pub fn share(image_uri: &str) -> ShareRequest {
    ShareRequest {
        message: format!("Check out this photo I took: {}", image_uri),
        url: image_uri.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapScreen {
    Ready {
        region: Region,
        markers: Vec<MapMarker>,
    },
    Unavailable {
        message: String,
    },
}

impl MapScreen {
    /// Lay out the map around the user's current position.
    pub fn build(records: &[PhotoRecord], locator: &dyn Locator, config: &MapConfig) -> Self {
        let position = match locator.acquire_coordinates() {
            Ok(position) => position,
            Err(e) => {
                warn!("Map has no user location: {}", e);
                let message = match e {
                    CaptureError::PermissionDenied(_) => {
                        "Permission to access location was denied".to_string()
                    }
                    other => other.to_string(),
                };
                return MapScreen::Unavailable { message };
            }
        };

        let mut markers = photo_markers(records);
        markers.push(current_location_marker(position));

        MapScreen::Ready {
            region: Region::around(position, config),
            markers,
        }
    }
}
