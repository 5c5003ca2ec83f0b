//! Durable Mirrors
//!
//! Small file-backed stores: the trade-history mirror that survives restarts
//! and the credential store the login flow reads and writes.
//!
//! Both stores treat the whole file as one value and overwrite it on every
//! save. Failures here are never fatal to the stream pipeline; callers log
//! and continue with in-memory state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::market::{Symbol, TradeHistory};

/// Errors from the file-backed stores.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// File could not be read or written.
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    /// Contents did not round-trip as JSON.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Trade Mirror
// =============================================================================

/// File-backed mirror of the per-symbol trade buffers.
///
/// The file holds one JSON object keyed by upper-case pair name. A save
/// replaces the whole file; a load replaces the whole in-memory history.
#[derive(Debug, Clone)]
pub struct TradeStore {
    path: PathBuf,
}

impl TradeStore {
    /// File name inside the store directory.
    const FILE_NAME: &'static str = "trade_history.json";

    /// Create a mirror rooted at the given store directory.
    #[must_use]
    pub fn new(store_dir: &Path) -> Self {
        Self {
            path: store_dir.join(Self::FILE_NAME),
        }
    }

    /// Overwrite the mirror with the given history.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the directory cannot be created or the
    /// file cannot be written.
    pub fn save(&self, history: &TradeHistory) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(history)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Load the mirrored history, if a mirror exists.
    ///
    /// Returns `Ok(None)` when no mirror file exists yet. Tracked symbols
    /// absent from the file default to empty histories, so a partial mirror
    /// still restores everything it has.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the file exists but cannot be read or
    /// is not valid JSON. Callers treat this as cold-start and begin with
    /// empty buffers.
    pub fn load(&self) -> Result<Option<TradeHistory>, PersistError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        let mut history: TradeHistory = serde_json::from_str(&json)?;

        for symbol in Symbol::all() {
            history.entry(symbol).or_default();
        }
        Ok(Some(history))
    }
}

// =============================================================================
// Credential Store
// =============================================================================

/// On-disk shape of the credential store.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(rename = "dashboard.apiKey")]
    api_key: String,
    #[serde(rename = "dashboard.apiSecret")]
    api_secret: String,
}

/// File-backed credential store for the login flow.
///
/// Credentials live under two opaque keys in one JSON file. The file is
/// overwritten on save and deleted on clear.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// File name inside the store directory.
    const FILE_NAME: &'static str = "credentials.json";

    /// Create a store rooted at the given store directory.
    #[must_use]
    pub fn new(store_dir: &Path) -> Self {
        Self {
            path: store_dir.join(Self::FILE_NAME),
        }
    }

    /// Persist a credential pair.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the file cannot be written.
    pub fn save(&self, api_key: &str, api_secret: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredCredentials {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        };
        let json = serde_json::to_string(&stored)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Load the stored credential pair, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load(&self) -> Result<Option<(String, String)>, PersistError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        let stored: StoredCredentials = serde_json::from_str(&json)?;
        Ok(Some((stored.api_key, stored.api_secret)))
    }

    /// Remove stored credentials. Missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
