//! Input discovery: turns a mix of file and folder paths into an ordered
//! list of check images.

use crate::error::{CheckAiError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

impl ImageInfo {
    fn from_path(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, file_name }
    }

    pub fn mime_type(&self) -> &'static str {
        match self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Collects images from explicit files and from folders. Folder entries are
/// filtered by extension and sorted by name; explicit files must be a
/// supported image type. Input order is preserved across arguments.
pub fn collect_images(inputs: &[PathBuf], recursive: bool) -> Result<Vec<ImageInfo>> {
    let mut images = Vec::new();

    for input in inputs {
        if !input.exists() {
            // A path with an image extension was meant as a file, anything
            // else as a folder.
            return Err(if is_image(input) {
                CheckAiError::FileNotFound(input.display().to_string())
            } else {
                CheckAiError::FolderNotFound(input.display().to_string())
            });
        }

        if input.is_file() {
            if !is_image(input) {
                return Err(CheckAiError::ImageUpload(format!(
                    "unsupported image type: {} (expected png/jpg/jpeg/webp)",
                    input.display()
                )));
            }
            images.push(ImageInfo::from_path(input.clone()));
            continue;
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_image(path))
            .collect();
        found.sort();
        images.extend(found.into_iter().map(ImageInfo::from_path));
    }

    Ok(images)
}
