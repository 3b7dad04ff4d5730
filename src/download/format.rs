use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::OutputFormat;

pub const DEFAULT_EXTENSION: &str = ".jpg";
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

pub fn extension_for_format(format: OutputFormat) -> Option<&'static str> {
    match format {
        OutputFormat::Original => None,
        OutputFormat::Jpg | OutputFormat::Jpeg => Some(".jpg"),
        OutputFormat::Png => Some(".png"),
        OutputFormat::Gif => Some(".gif"),
        OutputFormat::Webp => Some(".webp"),
        OutputFormat::Bmp => Some(".bmp"),
        OutputFormat::Tiff => Some(".tiff"),
    }
}

/// Case-insensitive token lookup; `original` yields `None`.
pub fn extension_for_token(token: &str) -> Result<Option<&'static str>> {
    let format: OutputFormat = token.parse()?;
    Ok(extension_for_format(format))
}

pub fn extension_for_content_type(content_type: Option<&str>) -> &'static str {
    let Some(content_type) = content_type else {
        return DEFAULT_EXTENSION;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tiff",
        _ => DEFAULT_EXTENSION,
    }
}

/// An explicit format wins; `original` defers to the observed content-type.
pub fn resolve_extension(format: OutputFormat, content_type: Option<&str>) -> &'static str {
    extension_for_format(format).unwrap_or_else(|| extension_for_content_type(content_type))
}

/// Replaces (or appends) the extension of `path`. `extension` includes the dot.
pub fn apply_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension.trim_start_matches('.'))
}

/// Human readable size using 1024 steps, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut threshold = 1024u64;
    while unit < UNITS.len() - 1 && bytes >= threshold {
        unit += 1;
        threshold = threshold.saturating_mul(1024);
    }

    let value = bytes as f64 / 1024f64.powi(unit as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
