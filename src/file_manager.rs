//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file e le utilità sui path.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva dei file convertibili in una directory
//! - Filtro per estensione (case-insensitive) con allow-list per tool
//! - Derivazione del path di output sostituendo l'estensione finale
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati supportati:
//! - **img2avif**: PNG, JPG, JPEG, JFIF, WebP
//! - **jpegopt**: JPG, JPEG, JFIF
//!
//! ## Esempio:
//! ```rust,no_run
//! # use imgpress::FileManager;
//! # fn demo() -> anyhow::Result<()> {
//! let files = FileManager::find_convertible_images("photos".as_ref())?;
//! for file in &files {
//!     let out = FileManager::with_extension(file, "avif");
//!     # let _ = out;
//! }
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions img2avif accepts as input.
pub const CONVERTIBLE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "jfif", "webp"];

/// Extensions jpegopt accepts as input.
pub const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jfif"];

/// Manages file discovery and path operations
pub struct FileManager;

impl FileManager {
    /// Find all images convertible to AVIF under a directory (recursive).
    pub fn find_convertible_images(dir: &Path) -> Result<Vec<PathBuf>> {
        Self::find_by_extension(dir, CONVERTIBLE_EXTENSIONS)
    }

    /// Find all JPEG files under a directory (recursive).
    pub fn find_jpeg_files(dir: &Path) -> Result<Vec<PathBuf>> {
        Self::find_by_extension(dir, JPEG_EXTENSIONS)
    }

    fn find_by_extension(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if Self::has_extension_in(path, extensions) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Check whether a path's extension (case-insensitive) is in the allow-list.
    pub fn has_extension_in(path: &Path, extensions: &[&str]) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            extensions.contains(&ext_lower.as_str())
        } else {
            false
        }
    }

    /// Derive a sibling path by replacing the final extension.
    ///
    /// Idempotent: replacing with the same extension twice yields the same path.
    pub fn with_extension(path: &Path, extension: &str) -> PathBuf {
        path.with_extension(extension)
    }

    /// Lowercased file name for log output.
    pub fn display_name(path: &Path) -> String {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_lowercase()
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_find_convertible_images_recursive_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("nested/deep")).unwrap();

        touch(&root.join("a.png"));
        touch(&root.join("b.JPG")); // case-insensitive match
        touch(&root.join("nested/c.jfif"));
        touch(&root.join("nested/deep/d.webp"));
        touch(&root.join("nested/skip.txt"));
        touch(&root.join("noext"));

        let mut found = FileManager::find_convertible_images(root).unwrap();
        found.sort();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(found.len(), 4);
        assert!(names.contains(&"a.png".to_string()));
        assert!(names.contains(&"b.JPG".to_string()));
        assert!(names.contains(&"c.jfif".to_string()));
        assert!(names.contains(&"d.webp".to_string()));
    }

    #[test]
    fn test_find_jpeg_files_excludes_png_and_webp() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("a.jpeg"));
        touch(&root.join("b.png"));
        touch(&root.join("c.webp"));
        touch(&root.join("d.jfif"));

        let found = FileManager::find_jpeg_files(root).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_find_in_empty_directory_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let found = FileManager::find_convertible_images(temp_dir.path()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_with_extension_is_idempotent() {
        let once = FileManager::with_extension(Path::new("/photos/img.png"), "avif");
        let twice = FileManager::with_extension(&once, "avif");
        assert_eq!(once, PathBuf::from("/photos/img.avif"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_display_name_lowercases() {
        assert_eq!(
            FileManager::display_name(Path::new("/photos/IMG_001.PNG")),
            "img_001.png"
        );
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(2048), "2.00 KB");
    }

    #[test]
    fn test_calculate_reduction() {
        assert_eq!(FileManager::calculate_reduction(100, 75), 25.0);
        assert_eq!(FileManager::calculate_reduction(0, 0), 0.0);
    }
}
