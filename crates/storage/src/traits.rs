//! Trait definitions for the offline storage system.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EpisodeRecord, MangaRecord};
use crate::types::{EpisodeId, MangaId};

/// Main trait for offline storage operations.
///
/// Implementations own the three storage trees (metadata records, poster
/// bytes, page bytes) under an application-private root and are responsible
/// for keeping them consistent across deletions.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    // === Manga records ===

    /// Persist a manga record.
    async fn save_manga(&self, record: &MangaRecord) -> Result<()>;

    /// Load a manga record.
    ///
    /// Returns `None` when the record is absent or unparseable; a corrupt
    /// record left behind by a crashed writer is treated the same as a
    /// missing one.
    async fn manga(&self, id: MangaId) -> Result<Option<MangaRecord>>;

    /// List every downloaded manga, sorted ascending by download start time.
    ///
    /// A metadata root that does not exist yet yields an empty list.
    async fn list_manga(&self) -> Result<Vec<MangaRecord>>;

    // === Episode records ===

    /// Persist an episode's durable progress record.
    async fn save_episode(&self, manga_id: MangaId, record: &EpisodeRecord) -> Result<()>;

    /// Load a single episode record, `None` if absent or corrupt.
    async fn episode(&self, manga_id: MangaId, episode_id: EpisodeId)
    -> Result<Option<EpisodeRecord>>;

    /// List every episode record stored for a manga.
    async fn list_episodes(&self, manga_id: MangaId) -> Result<Vec<EpisodeRecord>>;

    /// Count episode records for a manga; a missing directory counts as zero.
    async fn count_episodes(&self, manga_id: MangaId) -> Result<usize>;

    // === Raw file trees ===

    /// Write poster bytes, returning the offline locator for them.
    async fn store_poster(&self, manga_id: MangaId, bytes: &[u8]) -> Result<String>;

    /// Write one page's bytes, returning the offline locator for them.
    async fn store_page(
        &self,
        manga_id: MangaId,
        episode_id: EpisodeId,
        page_index: usize,
        bytes: &[u8],
    ) -> Result<String>;

    // === Cascading deletion ===

    /// Remove everything stored for a manga across all three trees.
    ///
    /// Every removal is independently best-effort: a target that is already
    /// gone is success, and a partially cleaned tree can be finished by a
    /// repeated call.
    async fn delete_manga(&self, manga_id: MangaId) -> Result<()>;

    /// Remove one episode's record and page files.
    ///
    /// When the last episode record of the manga is removed, the manga record
    /// and poster are removed as well; when the last page directory is
    /// removed, the manga's now-empty files directory goes with it. Both
    /// cascades are independent and best-effort.
    async fn delete_episode(&self, manga_id: MangaId, episode_id: EpisodeId) -> Result<()>;
}
