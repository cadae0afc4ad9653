//! Settings store implementation
//!
//! Provides file-based settings persistence with atomic writes.

use super::types::Settings;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Store for the persisted desired page size
#[derive(Debug, Clone)]
pub struct SettingsStore {
    /// Path to the settings file, empty in memory mode
    path: PathBuf,
    settings: Arc<RwLock<Settings>>,
    /// Returned when nothing usable is stored
    default_page_size: u64,
}

impl SettingsStore {
    /// Open a store backed by `path`, loading it if present.
    ///
    /// A file that cannot be parsed is logged and treated as empty; it is
    /// replaced on the next write.
    pub fn open(path: impl AsRef<Path>, default_page_size: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| Error::Settings {
                message: format!("Failed to read settings file: {e}"),
            })?;
            parse_settings(&contents, &path)
        } else {
            Settings::new()
        };

        Ok(Self {
            path,
            settings: Arc::new(RwLock::new(settings)),
            default_page_size,
        })
    }

    /// Create an in-memory store (no file persistence)
    pub fn in_memory(default_page_size: u64) -> Self {
        Self {
            path: PathBuf::new(),
            settings: Arc::new(RwLock::new(Settings::new())),
            default_page_size,
        }
    }

    /// Check if this store is in-memory only
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    /// Get the settings file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_page_size(&self) -> u64 {
        self.default_page_size
    }

    /// Desired page size, falling back to the default
    pub async fn desired_page_size(&self) -> u64 {
        self.settings
            .read()
            .await
            .desired_page_size()
            .unwrap_or(self.default_page_size)
    }

    /// Persist a new desired page size
    pub async fn set_desired_page_size(&self, size: u64) -> Result<()> {
        if size == 0 {
            return Err(Error::invalid_value(
                super::DESIRED_PAGE_SIZE_KEY,
                "must be a positive integer",
            ));
        }

        {
            let mut settings = self.settings.write().await;
            settings.set_desired_page_size(size);
        }
        debug!("Desired page size set to {size}");

        self.save().await
    }

    /// Re-read the settings file
    pub async fn reload(&self) -> Result<()> {
        if self.is_in_memory() || !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Settings {
                message: format!("Failed to read settings file: {e}"),
            })?;

        let loaded = parse_settings(&contents, &self.path);
        *self.settings.write().await = loaded;

        Ok(())
    }

    /// Save current settings to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = {
            let settings = self.settings.read().await;
            serde_json::to_string_pretty(&*settings).map_err(|e| Error::Settings {
                message: format!("Failed to serialize settings: {e}"),
            })?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::Settings {
                        message: format!("Failed to create settings directory: {e}"),
                    })?;
            }
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::Settings {
                message: format!("Failed to write settings file: {e}"),
            })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::Settings {
                message: format!("Failed to rename settings file: {e}"),
            })?;

        Ok(())
    }

    /// Snapshot of the stored document
    pub async fn snapshot(&self) -> Settings {
        self.settings.read().await.clone()
    }
}

fn parse_settings(contents: &str, path: &Path) -> Settings {
    match serde_json::from_str(contents) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Ignoring unreadable settings file {}: {e}", path.display());
            Settings::new()
        }
    }
}
