//! Download command handler: runs one episode task to completion or pause.

use std::path::Path;
use std::sync::Arc;

use eyre::{Context, Result};
use hondana_download::{DownloadTask, HttpFetcher};
use hondana_storage::{EpisodeMeta, FilesystemStorage, MangaMeta};
use serde::Deserialize;
use tracing::warn;

/// JSON manifest describing what to download, produced by whatever scraped
/// the episode listing.
#[derive(Debug, Deserialize)]
pub struct DownloadManifest {
    pub manga: MangaMeta,
    pub episode: EpisodeMeta,
}

pub async fn handle_download_command(
    manifest_path: &Path,
    storage: FilesystemStorage,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(manifest_path)
        .await
        .wrap_err_with(|| format!("reading manifest {}", manifest_path.display()))?;
    let manifest: DownloadManifest =
        serde_json::from_str(&raw).wrap_err("parsing download manifest")?;

    let total_pages = manifest.episode.pages.len();
    println!(
        "Downloading '{}' episode '{}' ({} pages)",
        manifest.manga.title, manifest.episode.title, total_pages
    );

    let task = Arc::new(DownloadTask::new(
        Arc::new(storage),
        Arc::new(HttpFetcher::new()),
        manifest.manga,
        manifest.episode,
    ));

    // Ctrl-C pauses cooperatively: in-flight page writes are rejected and
    // progress is force-saved before the task returns.
    let pause_handle = task.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("Pause requested, finishing in-flight pages...");
            pause_handle.pause();
        } else {
            warn!("failed to install Ctrl-C handler");
        }
    });

    task.start().await?;

    let progress = task.progress().await;
    if progress.is_complete() {
        println!("Done: {}/{} pages", progress.downloaded, total_pages);
    } else {
        println!(
            "Paused at {}/{} pages; run the same command again to resume",
            progress.downloaded, total_pages
        );
    }
    Ok(())
}
