//! Library command handlers for browsing and removing downloaded content.

use eyre::Result;
use hondana_storage::{EpisodeId, FilesystemStorage, MangaId, OfflineStore};

use crate::cli::LibraryCommands;

pub async fn handle_library_command(
    cmd: LibraryCommands,
    storage: &FilesystemStorage,
) -> Result<()> {
    match cmd {
        LibraryCommands::List => handle_list(storage).await,
        LibraryCommands::Episodes { manga_id } => {
            handle_episodes(MangaId::new(manga_id), storage).await
        }
        LibraryCommands::Show {
            manga_id,
            episode_id,
        } => handle_show(MangaId::new(manga_id), EpisodeId::new(episode_id), storage).await,
        LibraryCommands::Remove { manga_id, episode } => {
            handle_remove(MangaId::new(manga_id), episode.map(EpisodeId::new), storage).await
        }
    }
}

async fn handle_list(storage: &FilesystemStorage) -> Result<()> {
    let manga = storage.list_manga().await?;
    if manga.is_empty() {
        println!("No downloaded manga");
        return Ok(());
    }

    println!("Library ({} manga):", manga.len());
    for record in manga {
        let episodes = storage.count_episodes(record.id).await?;
        println!("  {} - {} ({} episodes)", record.id, record.title, episodes);
    }
    Ok(())
}

async fn handle_episodes(manga_id: MangaId, storage: &FilesystemStorage) -> Result<()> {
    let episodes = storage.list_episodes(manga_id).await?;
    if episodes.is_empty() {
        println!("No downloaded episodes for manga {manga_id}");
        return Ok(());
    }

    println!("Episodes ({}):", episodes.len());
    for record in episodes {
        let status = if record.is_complete() {
            "complete"
        } else {
            "partial"
        };
        println!(
            "  {} - {} [{}/{} pages, {}]",
            record.id,
            record.title,
            record.downloaded,
            record.pages.len(),
            status
        );
    }
    Ok(())
}

async fn handle_show(
    manga_id: MangaId,
    episode_id: EpisodeId,
    storage: &FilesystemStorage,
) -> Result<()> {
    match storage.episode(manga_id, episode_id).await? {
        Some(record) => {
            println!("{}", record.title);
            println!("Downloaded: {}/{}", record.downloaded, record.pages.len());
            for (index, page) in record.pages.iter().enumerate() {
                println!("  page {index}: {page}");
            }
        }
        None => println!("Episode not found: manga {manga_id}, episode {episode_id}"),
    }
    Ok(())
}

async fn handle_remove(
    manga_id: MangaId,
    episode_id: Option<EpisodeId>,
    storage: &FilesystemStorage,
) -> Result<()> {
    match episode_id {
        Some(episode_id) => {
            storage.delete_episode(manga_id, episode_id).await?;
            println!("Removed episode {episode_id} of manga {manga_id}");
        }
        None => {
            storage.delete_manga(manga_id).await?;
            println!("Removed manga {manga_id}");
        }
    }
    Ok(())
}
