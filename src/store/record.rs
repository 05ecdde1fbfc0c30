//! Photo record types.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A photo about to be written; the store assigns its key.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhoto {
    pub image_uri: String,
    pub location: Option<Coordinates>,
    /// Stored with millisecond precision; set it through [`NewPhoto::with_captured_at`].
    pub captured_at: Option<DateTime<Utc>>,
}

impl NewPhoto {
    pub fn new(image_uri: impl Into<String>) -> Self {
        Self {
            image_uri: image_uri.into(),
            location: None,
            captured_at: None,
        }
    }

    pub fn with_location(mut self, location: Coordinates) -> Self {
        self.location = Some(location);
        self
    }

    /// Sub-millisecond digits are dropped so the record reads back unchanged.
    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at.trunc_subsecs(3));
        self
    }
}

/// A photo as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub key: String,
    pub image_uri: String,
    pub location: Option<Coordinates>,
    pub captured_at: Option<DateTime<Utc>>,
}
