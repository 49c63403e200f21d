#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Default, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(default)]
    token: String,
    /// Convenience flag. The token's presence is what counts.
    #[serde(default)]
    logged_in: bool,
}

/// Durable storage for the credential token.
pub struct TokenStorage {
    pub file_path: path::PathBuf,
}

impl Default for TokenStorage {
    fn default() -> TokenStorage {
        return TokenStorage::new(path::PathBuf::from(Config::get(
            ConfigKey::CredentialsFile,
        )));
    }
}

impl TokenStorage {
    pub fn new(file_path: path::PathBuf) -> TokenStorage {
        return TokenStorage { file_path };
    }

    pub async fn load(&self) -> Result<Option<String>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let payload = fs::read_to_string(&self.file_path).await?;
        let stored: StoredCredentials = serde_yaml::from_str(&payload)?;
        if stored.token.trim().is_empty() {
            if stored.logged_in {
                tracing::warn!("Credentials file claims a login but holds no token");
            }
            return Ok(None);
        }

        return Ok(Some(stored.token));
    }

    pub async fn save(&self, token: &str) -> Result<()> {
        let payload = serde_yaml::to_string(&StoredCredentials {
            token: token.to_string(),
            logged_in: true,
        })?;

        if let Some(parent) = self.file_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(&self.file_path).await?;
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;

        return Ok(());
    }

    pub async fn clear(&self) -> Result<()> {
        if !self.file_path.exists() {
            return Ok(());
        }

        fs::remove_file(&self.file_path).await?;
        return Ok(());
    }
}
