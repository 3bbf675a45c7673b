//! Process configuration read from the environment at startup.
//!
//! ## Environment Variables
//! - `PORT` - port to listen on (default: `8080`)
//! - `GCS_BUCKET_NAME` - bucket receiving uploads (default: `roomatch-prod-static-site`)
//! - `PUBLIC_BASE_URL` - base of public GCS URLs (default: `https://storage.googleapis.com`)
//! - `LOCAL_STORAGE_PATH` - write objects to this directory instead of GCS (optional)
//! - `LOCAL_PUBLIC_BASE_URL` - base of public URLs for local objects (default: `/media`)
//! - `STATIC_DIR` - directory served for non-API paths (default: `html`)
//! - `LOG_LEVEL` - tracing filter when `RUST_LOG` is unset (default: `info`)

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::constants::{
    BUCKET_NAME, DEFAULT_PORT, DEFAULT_STATIC_DIR, GCS_PUBLIC_BASE_URL, LOCAL_MEDIA_PREFIX,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub bucket_name: String,
    pub public_base_url: String,
    pub local_storage_path: Option<PathBuf>,
    pub local_public_base_url: String,
    pub static_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT: {raw}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            bucket_name: var("GCS_BUCKET_NAME").unwrap_or_else(|| BUCKET_NAME.to_string()),
            public_base_url: var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| GCS_PUBLIC_BASE_URL.to_string()),
            local_storage_path: var("LOCAL_STORAGE_PATH").map(PathBuf::from),
            local_public_base_url: var("LOCAL_PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| LOCAL_MEDIA_PREFIX.to_string()),
            static_dir: var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bucket_name, "roomatch-prod-static-site");
        assert_eq!(config.public_base_url, "https://storage.googleapis.com");
        assert_eq!(config.local_storage_path, None);
        assert_eq!(config.local_public_base_url, "/media");
        assert_eq!(config.static_dir, PathBuf::from("html"));
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "3000"),
            ("GCS_BUCKET_NAME", "rooms"),
            ("PUBLIC_BASE_URL", "https://cdn.example.com/"),
            ("LOCAL_STORAGE_PATH", "/tmp/objects"),
            ("STATIC_DIR", "public"),
        ])
        .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bucket_name, "rooms");
        assert_eq!(config.public_base_url, "https://cdn.example.com");
        assert_eq!(config.local_storage_path, Some(PathBuf::from("/tmp/objects")));
        assert_eq!(config.static_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = config_from(&[("PORT", ""), ("GCS_BUCKET_NAME", "  ")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bucket_name, "roomatch-prod-static-site");
    }

    #[test]
    fn test_invalid_port() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
    }
}
