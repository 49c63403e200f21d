#[cfg(test)]
#[path = "settings_store_test.rs"]
mod tests;

use anyhow::Context;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ClientError;
use crate::domain::models::SettingUpdate;
use crate::domain::models::Settings;

fn config_number(key: ConfigKey) -> Result<u32> {
    return Config::get(key)
        .parse::<u32>()
        .with_context(|| return format!("{key} must be a positive whole number"));
}

/// Holds the processing parameters for the current run. Values are only
/// replaced by a validated copy, so readers never see a half-applied change.
pub struct SettingsStore {
    settings: Settings,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> SettingsStore {
        return SettingsStore { settings };
    }

    pub fn from_config() -> Result<SettingsStore> {
        let settings = Settings {
            persist_dir: Config::get(ConfigKey::PersistDir),
            embedding_model: Config::get(ConfigKey::EmbeddingModel),
            llm_model: Config::get(ConfigKey::LlmModel),
            top_k: config_number(ConfigKey::TopK)?,
            chunk_size: config_number(ConfigKey::ChunkSize)?,
            chunk_overlap: config_number(ConfigKey::ChunkOverlap)?,
        };
        settings.validate()?;

        return Ok(SettingsStore::new(settings));
    }

    pub fn get(&self) -> &Settings {
        return &self.settings;
    }

    /// Copy taken at dispatch time. Later updates do not affect it.
    pub fn snapshot(&self) -> Settings {
        return self.settings.clone();
    }

    pub fn update(&mut self, update: SettingUpdate) -> Result<(), ClientError> {
        let next = self.settings.with_update(update)?;
        tracing::debug!(settings = ?next, "Settings updated");
        self.settings = next;

        return Ok(());
    }
}
