//! Record models persisted as JSON under the metadata tree.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{EpisodeId, MangaId};

/// Caller-supplied identification of a manga. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangaMeta {
    pub id: MangaId,
    pub title: String,
    /// Remote source of the poster image.
    pub cover: String,
}

/// On-disk manga record.
///
/// Written once when the first episode download for the manga starts, and
/// never mutated afterwards; only catalog deletion removes it. `cover` holds
/// the offline poster locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangaRecord {
    pub id: MangaId,
    pub title: String,
    pub cover: String,
    /// Unix milliseconds of the first download start.
    pub started_at: i64,
}

impl MangaRecord {
    /// Capture a meta as a durable record with the poster already rewritten
    /// to its offline locator.
    pub fn capture(meta: &MangaMeta, cover_locator: String) -> Self {
        Self {
            id: meta.id,
            title: meta.title.clone(),
            cover: cover_locator,
            started_at: Utc::now().timestamp_millis(),
        }
    }
}

/// Caller-supplied identification of an episode and its page sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeMeta {
    pub id: EpisodeId,
    pub title: String,
    /// Ordered page source locators.
    pub pages: Vec<String>,
}

/// On-disk episode record: the episode meta plus durable download progress.
///
/// Each page locator is either a remote source or an `offline://` path; once
/// rewritten to offline it is never reverted. `downloaded` never exceeds
/// `pages.len()` and only increases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: EpisodeId,
    pub title: String,
    pub pages: Vec<String>,
    pub downloaded: u32,
    /// Unix milliseconds of the first download start.
    pub started_at: i64,
}

impl EpisodeRecord {
    /// Fresh record for an episode whose download is just beginning.
    pub fn begin(meta: &EpisodeMeta) -> Self {
        Self {
            id: meta.id,
            title: meta.title.clone(),
            pages: meta.pages.clone(),
            downloaded: 0,
            started_at: Utc::now().timestamp_millis(),
        }
    }

    /// Indexes of pages still carrying a remote locator.
    pub fn pending_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, locator)| !crate::layout::is_offline(locator))
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether every page has been rewritten to its offline form.
    pub fn is_complete(&self) -> bool {
        self.downloaded as usize >= self.pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_pages_skips_offline_locators() {
        let record = EpisodeRecord {
            id: EpisodeId::new(7),
            title: "Episode 7".to_string(),
            pages: vec![
                "offline://files/a/b/0".to_string(),
                "http://a/2.jpg".to_string(),
                "offline://files/a/b/2".to_string(),
            ],
            downloaded: 2,
            started_at: 0,
        };

        assert_eq!(record.pending_pages(), vec![1]);
        assert!(!record.is_complete());
    }

    #[test]
    fn begin_starts_with_zero_progress() {
        let meta = EpisodeMeta {
            id: EpisodeId::new(7),
            title: "Episode 7".to_string(),
            pages: vec!["http://a/1.jpg".to_string()],
        };

        let record = EpisodeRecord::begin(&meta);
        assert_eq!(record.downloaded, 0);
        assert_eq!(record.pages, meta.pages);
        assert!(record.started_at > 0);
    }
}
