//! Deterministic mapping from domain identifiers to storage paths.
//!
//! All functions here are pure: the same id always maps to the same path
//! within a process lifetime and across restarts. Layout under the storage
//! root:
//!
//! ```text
//! meta/<hash(manga_id)>.mod                          # manga record, JSON
//! meta/<hash(manga_id)>/<hash(episode_id)>.mod       # episode record, JSON
//! poster/<hash(manga_id)>                            # raw poster bytes
//! files/<hash(manga_id)>/<hash(episode_id)>/<hash(page_index)>  # raw page bytes
//! ```

use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::types::{EpisodeId, MangaId};

pub const DIR_META: &str = "meta";
pub const DIR_POSTER: &str = "poster";
pub const DIR_FILES: &str = "files";

/// Scheme prefix for a locator pointing at locally stored bytes.
pub const OFFLINE_SCHEME: &str = "offline://";

/// Check whether a page locator has already been rewritten to its local form.
pub fn is_offline(locator: &str) -> bool {
    locator.starts_with(OFFLINE_SCHEME)
}

/// Build an offline locator from a root-relative storage path.
pub fn offline_locator(relative: &str) -> String {
    format!("{OFFLINE_SCHEME}{relative}")
}

/// Hash a numeric id into a stable, filesystem-safe name.
///
/// Truncated sha256 of the decimal rendering; collision risk at 64 bits of
/// output is treated as out of scope.
pub fn hash_id(id: u64) -> String {
    let digest = Sha256::digest(id.to_string().as_bytes());
    format!("{:x}", digest)[..16].to_string()
}

/// Root-relative path of a manga's metadata record.
pub fn manga_record_path(manga_id: MangaId) -> PathBuf {
    PathBuf::from(DIR_META).join(format!("{}.mod", hash_id(manga_id.value())))
}

/// Root-relative directory holding a manga's episode records.
pub fn episode_record_dir(manga_id: MangaId) -> PathBuf {
    PathBuf::from(DIR_META).join(hash_id(manga_id.value()))
}

/// Root-relative path of an episode's metadata record.
pub fn episode_record_path(manga_id: MangaId, episode_id: EpisodeId) -> PathBuf {
    episode_record_dir(manga_id).join(format!("{}.mod", hash_id(episode_id.value())))
}

/// Root-relative path of a manga's poster bytes.
pub fn poster_path(manga_id: MangaId) -> PathBuf {
    PathBuf::from(DIR_POSTER).join(hash_id(manga_id.value()))
}

/// Root-relative directory holding every page file of a manga.
pub fn manga_files_dir(manga_id: MangaId) -> PathBuf {
    PathBuf::from(DIR_FILES).join(hash_id(manga_id.value()))
}

/// Root-relative directory holding one episode's page files.
pub fn episode_files_dir(manga_id: MangaId, episode_id: EpisodeId) -> PathBuf {
    manga_files_dir(manga_id).join(hash_id(episode_id.value()))
}

/// Root-relative path of a single page file.
pub fn page_file_path(manga_id: MangaId, episode_id: EpisodeId, page_index: usize) -> PathBuf {
    episode_files_dir(manga_id, episode_id).join(hash_id(page_index as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_distinct() {
        assert_eq!(hash_id(42), hash_id(42));
        assert_ne!(hash_id(42), hash_id(7));
        assert_eq!(hash_id(42).len(), 16);
        assert!(hash_id(42).chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn paths_nest_consistently() {
        let manga = MangaId::new(42);
        let episode = EpisodeId::new(7);

        let record = episode_record_path(manga, episode);
        assert!(record.starts_with(episode_record_dir(manga)));

        let page = page_file_path(manga, episode, 0);
        assert!(page.starts_with(episode_files_dir(manga, episode)));
        assert!(page.starts_with(manga_files_dir(manga)));
    }

    #[test]
    fn offline_locator_round_trip() {
        let locator = offline_locator("files/ab/cd/ef");
        assert!(is_offline(&locator));
        assert!(!is_offline("https://example.com/1.jpg"));
        assert_eq!(locator, "offline://files/ab/cd/ef");
    }
}
