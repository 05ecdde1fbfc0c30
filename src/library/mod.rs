//! Library view: every captured photo in a two-column grid.
//!
//! The view holds no state of its own beyond the last listing. It re-reads
//! the store whenever a change event arrives and at least once per refresh
//! interval, so a missed or lagged event costs at most one interval.

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use crate::store::{Coordinates, PhotoRecord, PhotoStore};

pub const GRID_COLUMNS: usize = 2;

/// One grid cell, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryEntry {
    pub key: String,
    pub image_uri: String,
    pub location_label: String,
    pub date_label: String,
}

impl LibraryEntry {
    pub fn from_record(record: &PhotoRecord) -> Self {
        Self::with_timezone(record, &Local)
    }

    fn with_timezone<Tz>(record: &PhotoRecord, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            key: record.key.clone(),
            image_uri: record.image_uri.clone(),
            location_label: location_label(record.location),
            date_label: record
                .captured_at
                .map(|at| date_label(&at, tz))
                .unwrap_or_else(|| "No date data".to_string()),
        }
    }
}

fn location_label(location: Option<Coordinates>) -> String {
    match location {
        Some(c) => format!("Lat: {:.6}, Lon: {:.6}", c.latitude, c.longitude),
        None => "No location data".to_string(),
    }
}

fn date_label<Tz>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// User-facing result of a destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    pub success: bool,
    pub title: &'static str,
    pub message: &'static str,
}

pub struct Library {
    store: Arc<PhotoStore>,
    entries: Vec<LibraryEntry>,
}

impl Library {
    pub fn new(store: Arc<PhotoStore>) -> Self {
        Self {
            store,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    /// Re-read the full listing from the store.
    pub fn refresh(&mut self) -> &[LibraryEntry] {
        self.entries = load_entries(&self.store);
        &self.entries
    }

    /// Grid rows of [`GRID_COLUMNS`] cells each.
    pub fn rows(&self) -> impl Iterator<Item = &[LibraryEntry]> {
        self.entries.chunks(GRID_COLUMNS)
    }

    pub fn delete_all(&mut self) -> Acknowledgment {
        match self.store.delete_all() {
            Ok(()) => {
                self.entries.clear();
                Acknowledgment {
                    success: true,
                    title: "Success",
                    message: "All photos have been deleted.",
                }
            }
            Err(e) => {
                error!("Error deleting all photos: {}", e);
                Acknowledgment {
                    success: false,
                    title: "Error",
                    message: "Failed to delete all photos.",
                }
            }
        }
    }
}

fn load_entries(store: &PhotoStore) -> Vec<LibraryEntry> {
    store.list_all().iter().map(LibraryEntry::from_record).collect()
}

/// Keep a listing of `store` current until `shutdown` resolves.
///
/// `on_refresh` receives the full listing once at start, after every store
/// change event, and whenever `interval` passes without one.
pub async fn watch<F, S>(
    store: Arc<PhotoStore>,
    interval: Duration,
    mut on_refresh: F,
    shutdown: S,
) -> Result<()>
where
    F: FnMut(&[LibraryEntry]),
    S: Future<Output = ()>,
{
    let mut events = store.subscribe();
    // A zero period would make the interval panic.
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                debug!("Library refresh interval elapsed");
            }
            event = events.recv() => {
                match event {
                    Ok(event) => debug!(?event, "Library refresh on store change"),
                    Err(RecvError::Lagged(missed)) => debug!(missed, "Library lagged behind store events"),
                    Err(RecvError::Closed) => break,
                }
                ticker.reset();
            }
        }

        let store = store.clone();
        let entries = tokio::task::spawn_blocking(move || load_entries(&store)).await?;
        on_refresh(&entries);
    }

    Ok(())
}
