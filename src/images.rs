//! Image store
//!
//! Downloaded strip images are kept on disk under one subdirectory per
//! source, with the filename taken from the image URL. Locations are
//! deterministic and files are written once and never rewritten; the caller
//! records the returned reference in the index only after the write has
//! succeeded, so a crash between the two steps leaves an orphan file rather
//! than a dangling database row.

use crate::{Result, StrippiError};
use std::fs;
use std::path::PathBuf;
use url::Url;

/// Filesystem store for strip images
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Opens the store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let root = dir.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Persists one downloaded image and returns its stable reference
    ///
    /// Re-storing the same (source, URL) pair keeps the existing file.
    pub fn store(&self, source_name: &str, image_url: &str, bytes: &[u8]) -> Result<String> {
        let filename = filename_from_url(image_url)?;

        let dir = self.root.join(slugify(source_name));
        fs::create_dir_all(&dir)?;

        let path = dir.join(filename);
        if !path.exists() {
            fs::write(&path, bytes)?;
        }

        Ok(path.to_string_lossy().into_owned())
    }

    /// Reads a previously stored image back
    pub fn load(&self, image_ref: &str) -> Result<Vec<u8>> {
        Ok(fs::read(image_ref)?)
    }
}

/// Last path segment of the image URL
fn filename_from_url(image_url: &str) -> Result<String> {
    let url = Url::parse(image_url)?;
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .ok_or_else(|| StrippiError::PageStructure {
            url: image_url.to_string(),
            message: "image URL has no filename".to_string(),
        })
}

/// Directory-safe form of a source name
fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
