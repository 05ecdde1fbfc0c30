use anyhow::Result;
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::json;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::map::photo_markers;
use crate::store::PhotoRecord;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    GeoJson,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::GeoJson => "geojson",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
            ExportFormat::GeoJson => "GeoJSON",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "geojson" => Some(ExportFormat::GeoJson),
            _ => None,
        }
    }

    /// Guess from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| Self::parse(&ext.to_string_lossy()))
            .unwrap_or(ExportFormat::Json)
    }

    /// `path`, with this format's extension added when it has none.
    pub fn output_path(&self, path: &Path) -> PathBuf {
        match path.extension() {
            Some(_) => path.to_path_buf(),
            None => path.with_extension(self.extension()),
        }
    }
}

/// Photo data for export
#[derive(Debug, Serialize)]
pub struct ExportedPhoto {
    pub key: String,
    pub uri: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<String>,
}

impl From<&PhotoRecord> for ExportedPhoto {
    fn from(record: &PhotoRecord) -> Self {
        Self {
            key: record.key.clone(),
            uri: record.image_uri.clone(),
            latitude: record.location.map(|c| c.latitude),
            longitude: record.location.map(|c| c.longitude),
            date: record
                .captured_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

/// Export records to a file, returns the number of items written.
///
/// GeoJSON only carries records with a location.
pub fn export_records(records: &[PhotoRecord], output_path: &Path, format: ExportFormat) -> Result<usize> {
    let photos: Vec<ExportedPhoto> = records.iter().map(ExportedPhoto::from).collect();

    match format {
        ExportFormat::Json => {
            export_json(&photos, output_path)?;
            Ok(photos.len())
        }
        ExportFormat::Csv => {
            export_csv(&photos, output_path)?;
            Ok(photos.len())
        }
        ExportFormat::GeoJson => export_geojson(records, output_path),
    }
}

fn export_json(photos: &[ExportedPhoto], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(photos)?;
    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn export_csv(photos: &[ExportedPhoto], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["key", "uri", "latitude", "longitude", "date"])?;

    for photo in photos {
        wtr.write_record([
            &photo.key,
            &photo.uri,
            &photo.latitude.map(|v| v.to_string()).unwrap_or_default(),
            &photo.longitude.map(|v| v.to_string()).unwrap_or_default(),
            photo.date.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn export_geojson(records: &[PhotoRecord], output_path: &Path) -> Result<usize> {
    let markers = photo_markers(records);
    // GeoJSON positions are [longitude, latitude]
    let features: Vec<_> = markers
        .iter()
        .map(|marker| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [marker.coordinate.longitude, marker.coordinate.latitude],
                },
                "properties": {
                    "key": marker.key,
                    "title": marker.title,
                    "uri": marker.image_uri,
                },
            })
        })
        .collect();

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    let mut file = File::create(output_path)?;
    file.write_all(serde_json::to_string_pretty(&collection)?.as_bytes())?;
    Ok(markers.len())
}
