use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by file name.
pub fn list_photos(dir: &Path) -> Result<Vec<PathBuf>> {
    let read = fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    let mut photos = Vec::new();
    for entry in read {
        let entry = entry.context("failed to read directory entry")?;
        let path = entry.path();
        if path.is_file() && is_image_path(&path) {
            photos.push(path);
        }
    }
    photos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(photos)
}

/// Resolves user-typed input: `~/` expands to `$HOME`, relative paths hang off `base`.
pub fn resolve_input_path(input: &str, base: &Path) -> Option<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return Some(PathBuf::from(home).join(rest));
    }
    let path = PathBuf::from(trimmed);
    if path.is_absolute() {
        Some(path)
    } else {
        Some(base.join(path))
    }
}
