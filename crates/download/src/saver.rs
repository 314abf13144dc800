//! Debounced persistence of episode progress records.

use std::sync::Arc;
use std::time::Duration;

use hondana_storage::{EpisodeRecord, MangaId, OfflineStore};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::Result;

/// Quiet interval a scheduled save must survive before it hits the disk.
pub const SAVE_DEBOUNCE: Duration = Duration::from_secs(1);

/// Single-slot debounced writer for one episode's progress record.
///
/// [`DebouncedSaver::schedule`] replaces any unfired pending save, so a burst
/// of page completions coalesces into a single disk write.
/// [`DebouncedSaver::flush`] cancels the pending save and writes immediately;
/// issuing it at the end of a run guarantees the last state is never dropped
/// by the debounce window.
pub struct DebouncedSaver {
    store: Arc<dyn OfflineStore>,
    manga_id: MangaId,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedSaver {
    pub fn new(store: Arc<dyn OfflineStore>, manga_id: MangaId) -> Self {
        Self {
            store,
            manga_id,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `record` to be saved after the quiet interval, replacing
    /// (not accumulating) any save already pending.
    pub async fn schedule(&self, record: EpisodeRecord) {
        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let store = self.store.clone();
        let manga_id = self.manga_id;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(SAVE_DEBOUNCE).await;
            if let Err(err) = store.save_episode(manga_id, &record).await {
                warn!(%manga_id, error = %err, "debounced progress save failed");
            }
        }));
    }

    /// Cancel any pending save and persist `record` now.
    pub async fn flush(&self, record: &EpisodeRecord) -> Result<()> {
        {
            let mut pending = self.pending.lock().await;
            if let Some(previous) = pending.take() {
                previous.abort();
            }
        }

        self.store.save_episode(self.manga_id, record).await?;
        Ok(())
    }
}
