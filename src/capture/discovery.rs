//! Bulk capture of images already on disk.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::{capture, ExifLocator, FileCamera, FixedLocator, LocatorChain};
use crate::config::CaptureConfig;
use crate::store::PhotoStore;

pub fn discover_images(directory: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension() {
                let ext_lower = ext.to_string_lossy().to_lowercase();
                if extensions.iter().any(|e| e.to_lowercase() == ext_lower) {
                    images.push(path.to_path_buf());
                }
            }
        }
    }

    // Path order doubles as capture order
    images.sort();

    Ok(images)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub located: usize,
    pub failed: usize,
}

/// Run the capture flow for every image under `directory`.
///
/// Each image is located from its own EXIF GPS tags, falling back to the
/// configured fixed location.
pub fn import_directory(
    store: &PhotoStore,
    directory: &Path,
    config: &CaptureConfig,
) -> Result<ImportSummary> {
    let images = discover_images(directory, &config.image_extensions)?;
    info!("Importing {} images from {:?}", images.len(), directory);

    let mut summary = ImportSummary::default();
    for path in &images {
        let camera = FileCamera::new(path);
        let locator = LocatorChain::new()
            .then(ExifLocator::new(path))
            .then(FixedLocator::new(config.location_fallback));

        match capture(store, &camera, &locator) {
            Ok(captured) if captured.key.is_some() => {
                summary.imported += 1;
                if captured.photo.location.is_some() {
                    summary.located += 1;
                }
            }
            Ok(_) => summary.failed += 1,
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
