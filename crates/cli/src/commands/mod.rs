pub mod download;
pub mod library;

pub use download::handle_download_command;
pub use library::handle_library_command;
