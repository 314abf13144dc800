use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[clap(name = "hondana", about = "Offline manga library manager")]
pub struct Cli {
    /// Storage root; defaults to the platform data directory.
    #[clap(long, global = true)]
    pub root: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Download an episode described by a JSON manifest
    Download {
        /// Path to a manifest holding the manga and episode metadata
        manifest: PathBuf,
    },
    /// Manage the library of downloaded manga
    Library {
        #[clap(subcommand)]
        command: LibraryCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum LibraryCommands {
    /// List downloaded manga with episode counts
    List,
    /// List the downloaded episodes of a manga
    Episodes {
        /// Numeric manga id
        manga_id: u64,
    },
    /// Show one episode's progress record
    Show {
        /// Numeric manga id
        manga_id: u64,
        /// Numeric episode id
        episode_id: u64,
    },
    /// Remove a manga, or a single episode with --episode
    Remove {
        /// Numeric manga id
        manga_id: u64,
        /// Remove only this episode (cascades into the manga when it is
        /// the last one)
        #[clap(long)]
        episode: Option<u64>,
    },
}
