//! Project document persistence layer
//!
//! Handles reading and writing the composite project document on disk.

use crate::error::{TesseraError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage backend for one project document
#[derive(Debug, Clone)]
pub struct ProjectStorage {
    /// Path of the project document
    path: PathBuf,
}

impl ProjectStorage {
    /// Create a storage instance for the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the document exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the whole document
    pub fn read_document(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| {
            TesseraError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to read project document {}: {}",
                    self.path.display(),
                    e
                ),
            ))
        })
    }

    /// Replace the document with `content`
    pub fn write_document(&self, content: &str) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    TesseraError::Io(std::io::Error::new(
                        e.kind(),
                        format!("Failed to create project directory: {}", e),
                    ))
                })?;
            }
        }

        // Write atomically using a temp file unique to this save
        let temp_path = self.temp_path();
        let written = fs::write(&temp_path, content)
            .map_err(|e| {
                std::io::Error::new(e.kind(), format!("Failed to write project document: {}", e))
            })
            .and_then(|()| {
                fs::rename(&temp_path, &self.path).map_err(|e| {
                    std::io::Error::new(e.kind(), format!("Failed to save project document: {}", e))
                })
            });

        if let Err(err) = written {
            if let Err(e) = fs::remove_file(&temp_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %temp_path.display(),
                        error = %e,
                        "failed to remove temp file"
                    );
                }
            }
            return Err(TesseraError::Io(err));
        }

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }
}
