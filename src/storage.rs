//! Upload artifact store: originals and derived heatmaps on disk.
//!
//! Filenames are derived deterministically from the client filename so
//! a heatmap can always be located from its original. Anything that is
//! not a plain portable filename character is replaced before writing.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extensions accepted for uploaded scans.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Prefix that turns an original filename into its heatmap filename.
const HEATMAP_PREFIX: &str = "heatmap_";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Filename is empty after sanitizing: {0:?}")]
    UnusableFilename(String),
}

/// Directory-backed store for uploaded scans and heatmap overlays.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Open the store, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a stored file.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Write an uploaded scan under its sanitized filename.
    /// Returns the stored name.
    pub fn save_original(&self, client_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let name = sanitize_filename(client_name)
            .ok_or_else(|| StorageError::UnusableFilename(client_name.to_string()))?;
        std::fs::write(self.root.join(&name), bytes)?;
        Ok(name)
    }

    /// Write a heatmap overlay derived from `original_name`.
    /// Returns the stored heatmap name.
    pub fn save_heatmap(&self, original_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let name = heatmap_name(original_name);
        std::fs::write(self.root.join(&name), bytes)?;
        Ok(name)
    }
}

/// Heatmap filename for an original: `heatmap_<original>`.
pub fn heatmap_name(original_name: &str) -> String {
    format!("{HEATMAP_PREFIX}{original_name}")
}

/// Whether the filename carries an accepted image extension.
pub fn allowed_extension(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.iter().any(|a| *a == ext)
        }
        _ => false,
    }
}

/// Reduce a client-supplied filename to a safe basename.
///
/// Path separators are stripped (only the final component survives) and
/// remaining characters outside [A-Za-z0-9._-] become underscores.
/// Returns `None` when nothing usable remains.
pub fn sanitize_filename(client_name: &str) -> Option<String> {
    let base = client_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(client_name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_extensions_case_insensitive() {
        assert!(allowed_extension("scan.png"));
        assert!(allowed_extension("scan.JPG"));
        assert!(allowed_extension("scan.jpeg"));
        assert!(!allowed_extension("scan.txt"));
        assert!(!allowed_extension("scan"));
        assert!(!allowed_extension(".png"));
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(
            sanitize_filename("../../etc/passwd.png").as_deref(),
            Some("passwd.png")
        );
        assert_eq!(
            sanitize_filename("C:\\scans\\eye scan.jpg").as_deref(),
            Some("eye_scan.jpg")
        );
    }

    #[test]
    fn sanitize_rejects_unusable_names() {
        assert!(sanitize_filename("").is_none());
        assert!(sanitize_filename("///").is_none());
        assert!(sanitize_filename("...").is_none());
    }

    #[test]
    fn heatmap_name_prefixes_original() {
        assert_eq!(heatmap_name("scan.png"), "heatmap_scan.png");
    }

    #[test]
    fn save_and_locate_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::open(tmp.path().join("uploads")).unwrap();

        let name = store.save_original("my scan.png", b"not-a-real-png").unwrap();
        assert_eq!(name, "my_scan.png");
        assert!(store.path_of(&name).exists());

        let heatmap = store.save_heatmap(&name, b"overlay").unwrap();
        assert_eq!(heatmap, "heatmap_my_scan.png");
        assert!(store.path_of(&heatmap).exists());
    }
}
