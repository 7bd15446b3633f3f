//! App-level configuration for the Google sink.
//!
//! User-provided OAuth credentials stored at:
//!   ~/.config/daycount/google/app_config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Google OAuth client credentials (user-provided).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

pub fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("daycount")
        .join("google"))
}

pub fn load() -> Result<Credentials> {
    load_from(&base_dir()?.join("app_config.toml"))
}

pub fn load_from(path: &Path) -> Result<Credentials> {
    if !path.exists() {
        anyhow::bail!(
            "Google credentials not found.\n\n\
            Create {} with:\n\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"\n\n\
            See https://console.cloud.google.com/apis/credentials for setup.",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

    let creds: Credentials = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse credentials from {}", path.display()))?;

    if creds.client_id.trim().is_empty() || creds.client_secret.trim().is_empty() {
        anyhow::bail!(
            "client_id and client_secret in {} must not be empty",
            path.display()
        );
    }

    Ok(creds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_explains_setup() {
        let dir = TempDir::new().unwrap();
        let err = load_from(&dir.path().join("app_config.toml")).unwrap_err();
        assert!(err.to_string().contains("client_id = "));
    }

    #[test]
    fn loads_credentials() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app_config.toml");
        std::fs::write(&path, "client_id = \"abc\"\nclient_secret = \"shh\"\n").unwrap();

        let creds = load_from(&path).unwrap();
        assert_eq!(creds.client_id, "abc");
        assert_eq!(creds.client_secret, "shh");
    }

    #[test]
    fn empty_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app_config.toml");
        std::fs::write(&path, "client_id = \"\"\nclient_secret = \"shh\"\n").unwrap();
        assert!(load_from(&path).is_err());
    }
}
