//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::validate::MAX_FILE_SIZE;

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Inspection endpoint settings used by the transmitter.
    pub server: ServerCfg,
    /// Local limits checked before upload.
    pub limits: LimitsCfg,
}

/// Where and how uploads are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCfg {
    /// Base URL of the inspection service, without trailing slash.
    pub endpoint: String,
    /// Route of the upload handler.
    pub upload_path: String,
    /// Multipart field carrying the file bytes.
    pub field_name: String,
    /// Request timeout in seconds; bounds the transmitting state.
    pub timeout_secs: u64,
}

/// Client-side limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsCfg {
    /// Maximum accepted file size in bytes.
    pub max_file_size: u64,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    /// Full URL of the upload route.
    pub fn upload_url(&self) -> String {
        format!(
            "{}/{}",
            self.server.endpoint.trim_end_matches('/'),
            self.server.upload_path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }
}

impl Default for Config {
    /// Defaults match the inspection service's stock deployment.
    fn default() -> Self {
        Self {
            server: ServerCfg {
                endpoint: "http://localhost:8080".into(),
                upload_path: "/api/upload".into(),
                field_name: "audioFile".into(),
                timeout_secs: 120,
            },
            limits: LimitsCfg {
                max_file_size: MAX_FILE_SIZE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ceiling_is_compatible() {
        let cfg = Config::default();
        assert_eq!(cfg.limits.max_file_size, 30_000_000);
        assert_eq!(cfg.server.field_name, "audioFile");
    }

    #[test]
    fn test_upload_url_joins_slashes() {
        let mut cfg = Config::default();
        assert_eq!(cfg.upload_url(), "http://localhost:8080/api/upload");
        cfg.server.endpoint = "http://probe.local/".into();
        cfg.server.upload_path = "upload".into();
        assert_eq!(cfg.upload_url(), "http://probe.local/upload");
    }

    #[test]
    fn test_load_or_default_creates_then_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let created = Config::load_or_default(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created, Config::default());

        let mut edited = created.clone();
        edited.server.timeout_secs = 5;
        edited.save(&path).unwrap();
        let loaded = Config::load_or_default(&path).unwrap();
        assert_eq!(loaded.server.timeout_secs, 5);
        assert_eq!(loaded.timeout(), Duration::from_secs(5));
    }
}
