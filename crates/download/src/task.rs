//! Download task controller: drives one episode to completion or pause.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use hondana_storage::{
    EpisodeId, EpisodeMeta, EpisodeRecord, MangaMeta, MangaRecord, OfflineStore,
};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::error::{DownloadError, Result};
use crate::fetcher::PageFetcher;
use crate::saver::DebouncedSaver;

/// Fixed cap on concurrent page fetches per task. Chosen to balance
/// throughput against connection pressure on constrained devices; not
/// user-configurable.
pub const MAX_CONCURRENT_PAGES: usize = 5;

/// One episode's download task.
///
/// The task owns its live progress record and a cooperative cancellation
/// flag shared with in-flight page fetches. Multiple tasks for different
/// episodes run independently; two task instances for the same episode
/// record are a caller error.
///
/// State machine: idle -> running -> {completed, paused, failed}, where
/// paused and failed both re-enter running via [`DownloadTask::resume`]
/// (identical to [`DownloadTask::start`]).
pub struct DownloadTask {
    store: Arc<dyn OfflineStore>,
    fetcher: Arc<dyn PageFetcher>,
    manga: MangaMeta,
    episode_id: EpisodeId,
    progress: Arc<Mutex<EpisodeRecord>>,
    running: Arc<AtomicBool>,
    saver: DebouncedSaver,
}

impl DownloadTask {
    pub fn new(
        store: Arc<dyn OfflineStore>,
        fetcher: Arc<dyn PageFetcher>,
        manga: MangaMeta,
        episode: EpisodeMeta,
    ) -> Self {
        let saver = DebouncedSaver::new(store.clone(), manga.id);
        Self {
            episode_id: episode.id,
            progress: Arc::new(Mutex::new(EpisodeRecord::begin(&episode))),
            running: Arc::new(AtomicBool::new(false)),
            store,
            fetcher,
            manga,
            saver,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request a cooperative pause.
    ///
    /// Only clears the running flag; the fan-out observes it, rejects any
    /// not-yet-committed page writes, and force-saves the progress record
    /// before `start()` returns.
    pub fn pause(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Resume a paused or failed task. Identical to [`DownloadTask::start`]:
    /// pages already rewritten to offline locators are skipped.
    pub async fn resume(&self) -> Result<()> {
        self.start().await
    }

    /// Snapshot of the live progress record.
    pub async fn progress(&self) -> EpisodeRecord {
        self.progress.lock().await.clone()
    }

    /// Run the episode download to completion or pause point.
    ///
    /// Returns `Ok` both on completion and on a pause observed mid-run;
    /// only a genuine transfer or storage failure is an error, and durable
    /// state is force-saved before it surfaces.
    pub async fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!(episode_id = %self.episode_id, "task is already running");
            return Ok(());
        }

        let result = self.run().await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    /// Ensure the manga record exists on disk, downloading the poster on
    /// first contact.
    ///
    /// Idempotent: an existing record is returned unchanged and the poster
    /// is not fetched again.
    pub async fn ensure_manga_record(&self) -> Result<MangaRecord> {
        if let Some(existing) = self.store.manga(self.manga.id).await? {
            return Ok(existing);
        }

        info!(manga_id = %self.manga.id, "first download for manga, fetching poster");
        let poster = self.fetcher.fetch(&self.manga.cover).await?;
        let cover = self.store.store_poster(self.manga.id, &poster).await?;

        let record = MangaRecord::capture(&self.manga, cover);
        self.store.save_manga(&record).await?;
        Ok(record)
    }

    async fn run(&self) -> Result<()> {
        self.ensure_manga_record().await?;

        // Merge durable progress from a previous run, so a resumed task
        // skips pages already rewritten to offline locators.
        if let Some(on_disk) = self.store.episode(self.manga.id, self.episode_id).await? {
            debug!(
                episode_id = %self.episode_id,
                downloaded = on_disk.downloaded,
                "resuming from existing progress record"
            );
            *self.progress.lock().await = on_disk;
        }

        // A pause may have raced with startup.
        if !self.running.load(Ordering::SeqCst) {
            debug!(episode_id = %self.episode_id, "paused before fan-out started");
            return Ok(());
        }

        let pending: Vec<(usize, String)> = {
            let progress = self.progress.lock().await;
            progress
                .pending_pages()
                .into_iter()
                .map(|index| (index, progress.pages[index].clone()))
                .collect()
        };

        let semaphore = Semaphore::new(MAX_CONCURRENT_PAGES);
        let results = join_all(pending.into_iter().map(|(index, url)| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| DownloadError::Cancelled)?;
                self.download_page(index, &url).await
            }
        }))
        .await;

        let mut paused = false;
        let mut failure: Option<DownloadError> = None;
        for result in results {
            match result {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => paused = true,
                Err(err) => failure = failure.or(Some(err)),
            }
        }

        // The forced save runs after every page completion has been
        // observed, so the persisted `downloaded` matches what this run
        // actually finished.
        let snapshot = self.progress.lock().await.clone();
        self.saver.flush(&snapshot).await?;

        if let Some(err) = failure {
            warn!(episode_id = %self.episode_id, error = %err, "episode download failed");
            return Err(err);
        }

        if paused {
            info!(
                episode_id = %self.episode_id,
                downloaded = snapshot.downloaded,
                "episode download paused"
            );
        } else {
            info!(
                episode_id = %self.episode_id,
                downloaded = snapshot.downloaded,
                "episode download complete"
            );
        }
        Ok(())
    }

    /// Fetch one page and commit it: write the bytes, rewrite the locator,
    /// bump the counter, schedule a debounced save.
    async fn download_page(&self, index: usize, url: &str) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(DownloadError::Cancelled);
        }

        let bytes = self.fetcher.fetch(url).await?;

        // A pause issued while the transfer was in flight must keep this
        // page out of the progress record.
        if !self.running.load(Ordering::SeqCst) {
            return Err(DownloadError::Cancelled);
        }

        let locator = self
            .store
            .store_page(self.manga.id, self.episode_id, index, &bytes)
            .await?;

        let snapshot = {
            let mut progress = self.progress.lock().await;
            progress.pages[index] = locator;
            progress.downloaded += 1;
            progress.clone()
        };
        self.saver.schedule(snapshot).await;

        Ok(())
    }
}
