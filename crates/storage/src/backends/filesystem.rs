//! Filesystem-based offline storage backend.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{Result, StorageError};
use crate::layout;
use crate::models::{EpisodeRecord, MangaRecord};
use crate::traits::OfflineStore;
use crate::types::{EpisodeId, MangaId};

/// Offline storage rooted at an application-private directory.
///
/// Records are stored as pretty-printed JSON `.mod` files under `meta/`,
/// poster and page bytes as raw files under `poster/` and `files/`. All
/// paths are derived through [`crate::layout`].
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    /// Create a backend rooted at `root`. Nothing is created on disk until
    /// the first write.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Read a JSON record, treating both absence and corruption as `None`.
    ///
    /// A record that fails to parse is most likely a partial write from a
    /// crashed process; surfacing it as missing keeps listings robust.
    async fn read_record<T: DeserializeOwned>(&self, relative: &Path) -> Result<Option<T>> {
        let path = self.resolve(relative);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::op(format!("read {}", path.display()), err)),
        };

        match serde_json::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "skipping corrupt record"
                );
                Ok(None)
            }
        }
    }

    /// Write a JSON record, creating parent directories as needed.
    async fn write_record<T: Serialize>(&self, relative: &Path, record: &T) -> Result<()> {
        let path = self.resolve(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::op(format!("create {}", parent.display()), err))?;
        }

        let content = serde_json::to_string_pretty(record).map_err(|err| {
            StorageError::CorruptRecord {
                path: path.display().to_string(),
                message: err.to_string(),
            }
        })?;

        fs::write(&path, content)
            .await
            .map_err(|err| StorageError::op(format!("write {}", path.display()), err))
    }

    /// Write raw bytes, creating parent directories as needed.
    async fn write_bytes(&self, relative: &Path, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::op(format!("create {}", parent.display()), err))?;
        }

        fs::write(&path, bytes)
            .await
            .map_err(|err| StorageError::op(format!("write {}", path.display()), err))
    }

    /// Collect the `.mod` records in a metadata directory, skipping anything
    /// unreadable. A missing directory yields an empty list.
    async fn read_record_dir<T: DeserializeOwned>(&self, relative: &Path) -> Result<Vec<T>> {
        let dir = self.resolve(relative);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StorageError::op(format!("read {}", dir.display()), err)),
        };

        let mut records = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(".mod") {
                continue;
            }
            if !entry.file_type().await.map_or(false, |ft| ft.is_file()) {
                continue;
            }
            if let Some(record) = self.read_record(&relative.join(name)).await? {
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Best-effort file removal: absence is success, anything else is logged
    /// and swallowed. Returns whether the file was actually removed.
    async fn remove_file_quiet(&self, relative: &Path) -> bool {
        let path = self.resolve(relative);
        match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(err) if err.kind() == ErrorKind::NotFound => false,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "ignoring failed removal");
                false
            }
        }
    }

    /// Best-effort recursive directory removal, same policy as
    /// [`Self::remove_file_quiet`].
    async fn remove_dir_quiet(&self, relative: &Path) -> bool {
        let path = self.resolve(relative);
        match fs::remove_dir_all(&path).await {
            Ok(()) => true,
            Err(err) if err.kind() == ErrorKind::NotFound => false,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "ignoring failed removal");
                false
            }
        }
    }

    /// Whether a directory holds no entries at all; a missing directory
    /// counts as empty. Any other read failure counts as non-empty, so a
    /// failed sibling check can never trigger a spurious cascade.
    async fn dir_is_empty(&self, relative: &Path) -> bool {
        let dir = self.resolve(relative);
        match fs::read_dir(&dir).await {
            Ok(mut entries) => matches!(entries.next_entry().await, Ok(None)),
            Err(err) if err.kind() == ErrorKind::NotFound => true,
            Err(err) => {
                debug!(path = %dir.display(), error = %err, "sibling check failed");
                false
            }
        }
    }

    /// Metadata half of episode deletion: drop the record, then cascade into
    /// the manga record and poster if no sibling episode records remain.
    async fn delete_episode_metadata(&self, manga_id: MangaId, episode_id: EpisodeId) {
        if !self
            .remove_file_quiet(&layout::episode_record_path(manga_id, episode_id))
            .await
        {
            return;
        }

        if self
            .dir_is_empty(&layout::episode_record_dir(manga_id))
            .await
        {
            debug!(%manga_id, "last episode record removed, dropping manga record");
            let poster = layout::poster_path(manga_id);
            let record = layout::manga_record_path(manga_id);
            tokio::join!(
                self.remove_file_quiet(&poster),
                self.remove_file_quiet(&record),
            );
        }
    }

    /// File-tree half of episode deletion: drop the page directory, then the
    /// manga's files directory if this was its last episode.
    async fn delete_episode_files(&self, manga_id: MangaId, episode_id: EpisodeId) {
        if !self
            .remove_dir_quiet(&layout::episode_files_dir(manga_id, episode_id))
            .await
        {
            return;
        }

        if self.dir_is_empty(&layout::manga_files_dir(manga_id)).await {
            self.remove_dir_quiet(&layout::manga_files_dir(manga_id))
                .await;
        }
    }
}

#[async_trait]
impl OfflineStore for FilesystemStorage {
    async fn save_manga(&self, record: &MangaRecord) -> Result<()> {
        self.write_record(&layout::manga_record_path(record.id), record)
            .await
    }

    async fn manga(&self, id: MangaId) -> Result<Option<MangaRecord>> {
        self.read_record(&layout::manga_record_path(id)).await
    }

    async fn list_manga(&self) -> Result<Vec<MangaRecord>> {
        let mut records: Vec<MangaRecord> =
            self.read_record_dir(Path::new(layout::DIR_META)).await?;
        records.sort_by_key(|record| record.started_at);
        Ok(records)
    }

    async fn save_episode(&self, manga_id: MangaId, record: &EpisodeRecord) -> Result<()> {
        self.write_record(&layout::episode_record_path(manga_id, record.id), record)
            .await
    }

    async fn episode(
        &self,
        manga_id: MangaId,
        episode_id: EpisodeId,
    ) -> Result<Option<EpisodeRecord>> {
        self.read_record(&layout::episode_record_path(manga_id, episode_id))
            .await
    }

    async fn list_episodes(&self, manga_id: MangaId) -> Result<Vec<EpisodeRecord>> {
        let mut records: Vec<EpisodeRecord> = self
            .read_record_dir(&layout::episode_record_dir(manga_id))
            .await?;
        records.sort_by_key(|record| record.started_at);
        Ok(records)
    }

    async fn count_episodes(&self, manga_id: MangaId) -> Result<usize> {
        let dir = self.resolve(&layout::episode_record_dir(manga_id));
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(StorageError::op(format!("read {}", dir.display()), err)),
        };

        let mut count = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_name().to_string_lossy().ends_with(".mod") {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn store_poster(&self, manga_id: MangaId, bytes: &[u8]) -> Result<String> {
        let relative = layout::poster_path(manga_id);
        self.write_bytes(&relative, bytes).await?;
        Ok(layout::offline_locator(&relative.to_string_lossy()))
    }

    async fn store_page(
        &self,
        manga_id: MangaId,
        episode_id: EpisodeId,
        page_index: usize,
        bytes: &[u8],
    ) -> Result<String> {
        let relative = layout::page_file_path(manga_id, episode_id, page_index);
        self.write_bytes(&relative, bytes).await?;
        Ok(layout::offline_locator(&relative.to_string_lossy()))
    }

    async fn delete_manga(&self, manga_id: MangaId) -> Result<()> {
        debug!(%manga_id, "deleting manga across all trees");
        let episode_records = layout::episode_record_dir(manga_id);
        let record = layout::manga_record_path(manga_id);
        let poster = layout::poster_path(manga_id);
        let files = layout::manga_files_dir(manga_id);
        tokio::join!(
            self.remove_dir_quiet(&episode_records),
            self.remove_file_quiet(&record),
            self.remove_file_quiet(&poster),
            self.remove_dir_quiet(&files),
        );
        Ok(())
    }

    async fn delete_episode(&self, manga_id: MangaId, episode_id: EpisodeId) -> Result<()> {
        debug!(%manga_id, %episode_id, "deleting episode");
        tokio::join!(
            self.delete_episode_metadata(manga_id, episode_id),
            self.delete_episode_files(manga_id, episode_id),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EpisodeMeta, MangaMeta};
    use tempfile::TempDir;

    fn manga_meta(id: u64) -> MangaMeta {
        MangaMeta {
            id: MangaId::new(id),
            title: format!("Manga {id}"),
            cover: format!("http://covers/{id}.jpg"),
        }
    }

    fn episode_record(id: u64, started_at: i64) -> EpisodeRecord {
        let meta = EpisodeMeta {
            id: EpisodeId::new(id),
            title: format!("Episode {id}"),
            pages: vec!["http://a/1.jpg".to_string(), "http://a/2.jpg".to_string()],
        };
        EpisodeRecord {
            started_at,
            ..EpisodeRecord::begin(&meta)
        }
    }

    #[tokio::test]
    async fn list_manga_on_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp.path().join("nonexistent"));

        assert!(storage.list_manga().await.unwrap().is_empty());
        assert_eq!(
            storage.count_episodes(MangaId::new(42)).await.unwrap(),
            0,
            "missing episode directory counts as zero"
        );
    }

    #[tokio::test]
    async fn unreadable_sibling_check_counts_as_non_empty() {
        let temp = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp.path());

        assert!(storage.dir_is_empty(Path::new("missing")).await);

        fs::create_dir(temp.path().join("occupied")).await.unwrap();
        fs::write(temp.path().join("occupied/entry"), b"x")
            .await
            .unwrap();
        assert!(!storage.dir_is_empty(Path::new("occupied")).await);

        // A path that exists but cannot be listed must not report empty,
        // or a failed sibling check would cascade into deleting the manga
        // record while episodes remain.
        fs::write(temp.path().join("blocked"), b"not a directory")
            .await
            .unwrap();
        assert!(!storage.dir_is_empty(Path::new("blocked")).await);
    }

    #[tokio::test]
    async fn manga_record_round_trip() {
        let temp = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp.path());

        let record = MangaRecord::capture(&manga_meta(42), "offline://poster/h42".to_string());
        storage.save_manga(&record).await.unwrap();

        let loaded = storage.manga(MangaId::new(42)).await.unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(storage.manga(MangaId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_manga_sorted_by_start_time() {
        let temp = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp.path());

        let mut newer = MangaRecord::capture(&manga_meta(1), "offline://poster/a".to_string());
        newer.started_at = 2000;
        let mut older = MangaRecord::capture(&manga_meta(2), "offline://poster/b".to_string());
        older.started_at = 1000;

        storage.save_manga(&newer).await.unwrap();
        storage.save_manga(&older).await.unwrap();

        let listed = storage.list_manga().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, MangaId::new(2));
        assert_eq!(listed[1].id, MangaId::new(1));
    }

    #[tokio::test]
    async fn corrupt_record_is_treated_as_absent() {
        let temp = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp.path());

        let good = MangaRecord::capture(&manga_meta(1), "offline://poster/a".to_string());
        storage.save_manga(&good).await.unwrap();

        // Simulate a partial write from a crashed process.
        let bad_path = temp.path().join(layout::manga_record_path(MangaId::new(2)));
        fs::write(&bad_path, "{\"id\": 2, \"title\":").await.unwrap();

        assert!(storage.manga(MangaId::new(2)).await.unwrap().is_none());
        let listed = storage.list_manga().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, MangaId::new(1));
    }

    #[tokio::test]
    async fn episode_records_listed_and_counted() {
        let temp = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp.path());
        let manga = MangaId::new(42);

        storage
            .save_episode(manga, &episode_record(7, 100))
            .await
            .unwrap();
        storage
            .save_episode(manga, &episode_record(8, 50))
            .await
            .unwrap();

        assert_eq!(storage.count_episodes(manga).await.unwrap(), 2);
        let listed = storage.list_episodes(manga).await.unwrap();
        assert_eq!(listed[0].id, EpisodeId::new(8));
        assert_eq!(listed[1].id, EpisodeId::new(7));
    }

    #[tokio::test]
    async fn store_page_creates_directories_and_locator() {
        let temp = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp.path());
        let manga = MangaId::new(42);
        let episode = EpisodeId::new(7);

        let locator = storage
            .store_page(manga, episode, 0, b"page bytes")
            .await
            .unwrap();

        let expected_relative = layout::page_file_path(manga, episode, 0);
        assert_eq!(
            locator,
            layout::offline_locator(&expected_relative.to_string_lossy())
        );
        let stored = fs::read(temp.path().join(expected_relative)).await.unwrap();
        assert_eq!(stored, b"page bytes");
    }

    #[tokio::test]
    async fn delete_manga_clears_all_trees_and_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp.path());
        let manga = MangaId::new(42);

        let record = MangaRecord::capture(&manga_meta(42), "offline://poster/h".to_string());
        storage.save_manga(&record).await.unwrap();
        storage
            .save_episode(manga, &episode_record(7, 1))
            .await
            .unwrap();
        storage.store_poster(manga, b"poster").await.unwrap();
        storage
            .store_page(manga, EpisodeId::new(7), 0, b"page")
            .await
            .unwrap();

        storage.delete_manga(manga).await.unwrap();

        assert!(storage.manga(manga).await.unwrap().is_none());
        assert_eq!(storage.count_episodes(manga).await.unwrap(), 0);
        assert!(!temp.path().join(layout::poster_path(manga)).exists());
        assert!(!temp.path().join(layout::manga_files_dir(manga)).exists());

        // A second delete over the already-clean tree still succeeds.
        storage.delete_manga(manga).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_last_episode_cascades_to_manga() {
        let temp = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp.path());
        let manga = MangaId::new(42);
        let episode = EpisodeId::new(7);

        let record = MangaRecord::capture(&manga_meta(42), "offline://poster/h".to_string());
        storage.save_manga(&record).await.unwrap();
        storage
            .save_episode(manga, &episode_record(7, 1))
            .await
            .unwrap();
        storage.store_poster(manga, b"poster").await.unwrap();
        storage.store_page(manga, episode, 0, b"page").await.unwrap();

        storage.delete_episode(manga, episode).await.unwrap();

        assert!(storage.episode(manga, episode).await.unwrap().is_none());
        assert!(
            storage.manga(manga).await.unwrap().is_none(),
            "manga record should go with its last episode"
        );
        assert!(!temp.path().join(layout::poster_path(manga)).exists());
        assert!(
            !temp.path().join(layout::manga_files_dir(manga)).exists(),
            "emptied files directory should be removed"
        );
    }

    #[tokio::test]
    async fn deleting_non_last_episode_leaves_manga_intact() {
        let temp = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp.path());
        let manga = MangaId::new(42);

        let record = MangaRecord::capture(&manga_meta(42), "offline://poster/h".to_string());
        storage.save_manga(&record).await.unwrap();
        storage
            .save_episode(manga, &episode_record(7, 1))
            .await
            .unwrap();
        storage
            .save_episode(manga, &episode_record(8, 2))
            .await
            .unwrap();
        storage.store_poster(manga, b"poster").await.unwrap();
        storage
            .store_page(manga, EpisodeId::new(7), 0, b"page7")
            .await
            .unwrap();
        storage
            .store_page(manga, EpisodeId::new(8), 0, b"page8")
            .await
            .unwrap();

        storage.delete_episode(manga, EpisodeId::new(7)).await.unwrap();

        assert!(storage.manga(manga).await.unwrap().is_some());
        assert!(temp.path().join(layout::poster_path(manga)).exists());
        assert_eq!(storage.count_episodes(manga).await.unwrap(), 1);
        assert!(
            temp.path()
                .join(layout::episode_files_dir(manga, EpisodeId::new(8)))
                .exists()
        );
        assert!(
            !temp
                .path()
                .join(layout::episode_files_dir(manga, EpisodeId::new(7)))
                .exists()
        );
    }
}
