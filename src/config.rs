//! Transfer settings and remote aliases.
//!
//! Settings come from an optional TOML file:
//!
//! ```toml
//! token_env = "DROPBOX_TOKEN"
//!
//! [transfer]
//! chunk_size = 104857600
//! page_limit = 3
//!
//! [aliases]
//! team = "/Lab Team Folder"
//! ```
//!
//! Everything is validated when the file is loaded, so a bad chunk size or a
//! malformed alias fails before any transfer starts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferError};
use crate::store::MAX_REQUEST_SIZE;

/// Default request size for uploads (100 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

/// Tuning for uploads and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes per upload request; larger files use an upload session
    pub chunk_size: u64,
    /// Extra listing pages fetched after the first one
    pub page_limit: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            page_limit: 0,
        }
    }
}

impl TransferConfig {
    pub fn validate(&self) -> Result<()> {
        validate_chunk_size(self.chunk_size)
    }
}

/// Reject chunk sizes the store would refuse.
pub fn validate_chunk_size(chunk_size: u64) -> Result<()> {
    if chunk_size == 0 {
        return Err(TransferError::Config(
            "chunk size must be greater than zero".to_string(),
        ));
    }
    if chunk_size > MAX_REQUEST_SIZE {
        return Err(TransferError::Config(format!(
            "the Dropbox API does not accept requests over 150 MiB; \
             chunk size {} exceeds {}",
            chunk_size, MAX_REQUEST_SIZE
        )));
    }
    Ok(())
}

/// Logical remote names mapped to the remote root paths they stand for.
///
/// A remote path written as `team:/reports` resolves to
/// `/Lab Team Folder/reports` when `team = "/Lab Team Folder"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteAliases(BTreeMap<String, String>);

impl RemoteAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alias, validating both sides.
    pub fn insert(&mut self, name: impl Into<String>, target: impl Into<String>) -> Result<()> {
        let name = name.into();
        let target = target.into();
        validate_alias(&name, &target)?;
        self.0.insert(name, target);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.0
            .iter()
            .try_for_each(|(name, target)| validate_alias(name, target))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve an `alias:path` reference. Paths without an alias prefix are
    /// returned unchanged.
    pub fn resolve(&self, remote: &str) -> Result<String> {
        let Some((name, rest)) = split_alias(remote) else {
            return Ok(remote.to_string());
        };
        let target = self
            .get(name)
            .ok_or_else(|| TransferError::Config(format!("unknown remote alias: {}", name)))?;

        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            return Ok(target.to_string());
        }
        Ok(format!("{}/{}", target.trim_end_matches('/'), rest))
    }
}

/// `name:rest` where name is a valid alias token and comes before any slash.
fn split_alias(remote: &str) -> Option<(&str, &str)> {
    let (name, rest) = remote.split_once(':')?;
    if name.is_empty() || name.contains('/') || !is_alias_name(name) {
        return None;
    }
    Some((name, rest))
}

fn is_alias_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn validate_alias(name: &str, target: &str) -> Result<()> {
    if name.is_empty() || !is_alias_name(name) {
        return Err(TransferError::Config(format!(
            "invalid alias name {:?}: use letters, digits, '-' or '_'",
            name
        )));
    }
    if !target.starts_with('/') {
        return Err(TransferError::Config(format!(
            "alias {} must point to an absolute remote path, got {:?}",
            name, target
        )));
    }
    if target.contains("//") || (target.len() > 1 && target.ends_with('/')) {
        return Err(TransferError::Config(format!(
            "alias {} has a malformed remote path {:?}",
            name, target
        )));
    }
    Ok(())
}

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Environment variable holding the access token
    pub token_env: Option<String>,
    /// Proxy for all API requests
    pub proxy: Option<String>,
    pub transfer: TransferConfig,
    pub aliases: RemoteAliases,
}

impl Settings {
    /// Default settings file location (e.g. `~/.config/dbx-transfer/config.toml`).
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("dbx-transfer").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("dbx-transfer.toml"))
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)
            .map_err(|e| TransferError::Config(format!("invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TransferError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Load from the default location, falling back to defaults when no file exists.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading settings");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.transfer.validate()?;
        self.aliases.validate()?;
        if let Some(var) = &self.token_env {
            if var.is_empty() || var.contains('=') {
                return Err(TransferError::Config(format!(
                    "invalid token_env {:?}",
                    var
                )));
            }
        }
        Ok(())
    }
}
