//! Episode download engine for the offline library.
//!
//! A [`DownloadTask`] drives one episode's pages to disk under a fixed
//! concurrency cap, persists progress with debounced saves, and supports
//! cooperative pause/resume that survives process restarts.

pub mod error;
pub mod fetcher;
pub mod saver;
pub mod task;

pub use error::{DownloadError, Result};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use saver::{DebouncedSaver, SAVE_DEBOUNCE};
pub use task::{DownloadTask, MAX_CONCURRENT_PAGES};
