pub mod capture;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod library;
pub mod logging;
pub mod map;
pub mod shell;
pub mod store;

pub use config::Config;
pub use error::{CaptureError, StoreError};
pub use store::{Coordinates, NewPhoto, PhotoRecord, PhotoStore, StoreEvent};
