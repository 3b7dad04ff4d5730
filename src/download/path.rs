use std::path::{Component, Path};

use crate::error::{ModelsLabError, Result};

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff"];

/// Returns true when `path` is non-empty, does not climb above its starting
/// point once normalized, and carries an accepted image extension.
pub fn is_valid_image_path(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return false;
    }
    if escapes_base(path) {
        return false;
    }
    has_image_extension(path)
}

pub fn ensure_valid_image_path(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if is_valid_image_path(path) {
        Ok(())
    } else {
        Err(ModelsLabError::PathError(format!(
            "invalid image file path '{}': only {} files without '..' traversal are allowed",
            path.display(),
            ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| format!(".{}", ext))
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

/// A batch name prefix must stay a bare file name stem so that
/// `<dir>/<prefix>_<n><ext>` cannot leave `dir`.
pub fn ensure_valid_name_prefix(prefix: &str) -> Result<()> {
    let problem = if prefix.trim().is_empty() {
        Some("cannot be empty")
    } else if Path::new(prefix).is_absolute() || Path::new(prefix).has_root() {
        Some("must not be an absolute path")
    } else if prefix.contains(&['/', '\\', ':'][..]) {
        Some("must not contain path separators")
    } else if prefix.contains("..") {
        Some("must not contain '..'")
    } else {
        None
    };

    match problem {
        Some(message) => Err(ModelsLabError::validation("namePrefix", message)),
        None => Ok(()),
    }
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

// Lexical normalization: `a/../b.png` stays inside, `../b.png` does not.
// A `..` directly under the root collapses into the root.
fn escapes_base(path: &Path) -> bool {
    let mut depth = 0usize;
    let mut rooted = false;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => rooted = true,
            Component::CurDir => {}
            Component::Normal(_) => depth += 1,
            Component::ParentDir => {
                if depth > 0 {
                    depth -= 1;
                } else if !rooted {
                    return true;
                }
            }
        }
    }
    false
}
