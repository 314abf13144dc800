//! Offline storage for downloaded manga content.
//!
//! This crate provides a trait-based storage system for the offline library:
//! JSON metadata records for manga and episodes, raw poster/page files, and
//! the cascading deletion rules that keep the three storage trees consistent.

pub mod backends;
pub mod error;
pub mod layout;
pub mod models;
pub mod traits;
pub mod types;

// Re-export the main interface and types for easy access
pub use backends::FilesystemStorage;
pub use error::{Result, StorageError};
pub use layout::{OFFLINE_SCHEME, is_offline, offline_locator};
pub use models::{EpisodeMeta, EpisodeRecord, MangaMeta, MangaRecord};
pub use traits::OfflineStore;
pub use types::{EpisodeId, MangaId};
