//! Server configuration types

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Directory name used when no storage location is configured
pub const DEFAULT_DATA_DIR: &str = "charta-temp";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    128 * 1024 * 1024
}

/// Canvas storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub data_dir: Option<String>,
    /// Largest canvas area accepted by create, in pixels
    #[serde(default = "default_max_canvas_pixels")]
    pub max_canvas_pixels: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_canvas_pixels: default_max_canvas_pixels(),
        }
    }
}

fn default_max_canvas_pixels() -> u64 {
    chartographer_core::DEFAULT_MAX_PIXELS
}

impl StorageConfig {
    /// Pick the canvas directory: explicit override, then the configured
    /// path, then a new OS temp directory, then `./charta-temp`.
    pub fn resolve_data_dir(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        let dir = if let Some(dir) = cli_override {
            dir.to_path_buf()
        } else if let Some(dir) = self.data_dir.as_deref().filter(|d| !d.trim().is_empty()) {
            PathBuf::from(dir)
        } else {
            match tempfile::Builder::new().prefix(DEFAULT_DATA_DIR).tempdir() {
                Ok(tmp) => tmp.keep(),
                Err(e) => {
                    warn!("Cannot create temp directory ({}), using ./{}", e, DEFAULT_DATA_DIR);
                    PathBuf::from(DEFAULT_DATA_DIR)
                }
            }
        };

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(dir)
    }
}
