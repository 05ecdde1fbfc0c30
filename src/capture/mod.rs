//! Capture flow: camera + positioning + clock into one store write.

pub mod discovery;
pub mod gps;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::store::{Coordinates, NewPhoto, PhotoStore};

pub use discovery::{discover_images, import_directory, ImportSummary};
pub use gps::ExifLocator;

/// Produces the URI of a freshly captured image.
pub trait Camera {
    fn acquire_image(&self) -> Result<String, CaptureError>;
}

/// Produces the device's current position.
pub trait Locator {
    fn acquire_coordinates(&self) -> Result<Coordinates, CaptureError>;
}

/// Outcome of one capture.
#[derive(Debug, Clone, PartialEq)]
pub struct Captured {
    /// Store key, `None` when a best-effort write was dropped.
    pub key: Option<String>,
    pub photo: NewPhoto,
}

/// Capture one photo and persist it.
///
/// A camera failure aborts before anything is written. A positioning failure
/// only leaves the record without a location.
pub fn capture(
    store: &PhotoStore,
    camera: &dyn Camera,
    locator: &dyn Locator,
) -> Result<Captured, CaptureError> {
    let image_uri = camera.acquire_image()?;
    debug!("Photo: {}", image_uri);

    let location = match locator.acquire_coordinates() {
        Ok(coords) => Some(coords),
        Err(e) => {
            warn!("Capturing {} without location: {}", image_uri, e);
            None
        }
    };

    let mut photo = NewPhoto::new(image_uri).with_captured_at(store.clock().now());
    photo.location = location;

    let key = store.write(&photo)?;
    if let Some(ref key) = key {
        info!(key = %key, located = location.is_some(), "Captured {}", photo.image_uri);
    }
    Ok(Captured { key, photo })
}

/// A camera whose "shutter" is an image file already on disk.
pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Camera for FileCamera {
    fn acquire_image(&self) -> Result<String, CaptureError> {
        let path = self.path.canonicalize().map_err(|e| io_to_capture(&self.path, e))?;
        std::fs::File::open(&path).map_err(|e| io_to_capture(&path, e))?;
        if !path.is_file() {
            return Err(CaptureError::ImageUnavailable(format!(
                "{} is not a file",
                path.display()
            )));
        }
        Ok(file_uri(&path))
    }
}

fn io_to_capture(path: &Path, err: std::io::Error) -> CaptureError {
    match err.kind() {
        ErrorKind::PermissionDenied => {
            CaptureError::PermissionDenied(format!("{}: {}", path.display(), err))
        }
        _ => CaptureError::ImageUnavailable(format!("{}: {}", path.display(), err)),
    }
}

pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.to_string_lossy())
}

/// A positioning source that always reports the same place, or nothing.
pub struct FixedLocator {
    coordinates: Option<Coordinates>,
}

impl FixedLocator {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

impl Locator for FixedLocator {
    fn acquire_coordinates(&self) -> Result<Coordinates, CaptureError> {
        self.coordinates.ok_or_else(|| {
            CaptureError::LocationUnavailable("no location source configured".to_string())
        })
    }
}

/// Tries each locator in turn and returns the first position found.
#[derive(Default)]
pub struct LocatorChain {
    locators: Vec<Box<dyn Locator>>,
}

impl LocatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, locator: impl Locator + 'static) -> Self {
        self.locators.push(Box::new(locator));
        self
    }
}

impl Locator for LocatorChain {
    fn acquire_coordinates(&self) -> Result<Coordinates, CaptureError> {
        let mut last_err = None;
        for locator in &self.locators {
            match locator.acquire_coordinates() {
                Ok(coords) => return Ok(coords),
                Err(e) => {
                    debug!("Locator failed: {}", e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            CaptureError::LocationUnavailable("no locators configured".to_string())
        }))
    }
}
