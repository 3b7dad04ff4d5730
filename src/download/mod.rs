pub mod downloader;
pub mod fetcher;
pub mod format;
pub mod path;

pub use downloader::ImageDownloader;
pub use fetcher::{ArtifactFetcher, FetchedArtifact, HttpFetcher};
pub use format::{
    extension_for_content_type, extension_for_format, extension_for_token, format_file_size,
    resolve_extension,
};
pub use path::{ensure_valid_image_path, ensure_valid_name_prefix, is_valid_image_path};
