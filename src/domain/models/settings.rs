#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ClientError;

pub const DEFAULT_TOP_K: u32 = 4;
pub const MIN_TOP_K: u32 = 1;
pub const MAX_TOP_K: u32 = 10;

/// Processing parameters sent alongside every ingestion and question. Field
/// names are camelCase on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub persist_dir: String,
    pub embedding_model: String,
    pub llm_model: String,
    pub top_k: u32,
    pub chunk_size: u32,
    pub chunk_overlap: u32,
}

impl Default for Settings {
    fn default() -> Settings {
        return Settings {
            persist_dir: "chroma_kb_db".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            llm_model: "llama3".to_string(),
            top_k: DEFAULT_TOP_K,
            chunk_size: 1000,
            chunk_overlap: 150,
        };
    }
}

/// A single-field change to [`Settings`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingUpdate {
    PersistDir(String),
    EmbeddingModel(String),
    LlmModel(String),
    TopK(u32),
    ChunkSize(u32),
    ChunkOverlap(u32),
}

impl SettingUpdate {
    /// Parses a `key value` pair using the same kebab-case names as the
    /// config file.
    pub fn parse(key: &str, value: &str) -> Result<SettingUpdate, ClientError> {
        let value = value.trim();
        let number = || {
            return value.parse::<u32>().map_err(|_| {
                return ClientError::Validation(format!("{key} must be a positive whole number"));
            });
        };

        match key {
            "persist-dir" => return Ok(SettingUpdate::PersistDir(value.to_string())),
            "embedding-model" => return Ok(SettingUpdate::EmbeddingModel(value.to_string())),
            "llm-model" => return Ok(SettingUpdate::LlmModel(value.to_string())),
            "top-k" => return Ok(SettingUpdate::TopK(number()?)),
            "chunk-size" => return Ok(SettingUpdate::ChunkSize(number()?)),
            "chunk-overlap" => return Ok(SettingUpdate::ChunkOverlap(number()?)),
            _ => return Err(ClientError::Validation(format!("Unknown setting '{key}'"))),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.persist_dir.trim().is_empty() {
            return Err(ClientError::Validation(
                "Storage location cannot be empty".to_string(),
            ));
        }
        if self.embedding_model.trim().is_empty() || self.llm_model.trim().is_empty() {
            return Err(ClientError::Validation(
                "Model names cannot be empty".to_string(),
            ));
        }
        if !(MIN_TOP_K..=MAX_TOP_K).contains(&self.top_k) {
            return Err(ClientError::Validation(format!(
                "Top K must be between {MIN_TOP_K} and {MAX_TOP_K}"
            )));
        }
        if self.chunk_size == 0 {
            return Err(ClientError::Validation(
                "Chunk size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ClientError::Validation(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        return Ok(());
    }

    /// Returns a copy with `update` applied, or the validation failure. The
    /// receiver is never modified.
    pub fn with_update(&self, update: SettingUpdate) -> Result<Settings, ClientError> {
        let mut next = self.clone();
        match update {
            SettingUpdate::PersistDir(val) => next.persist_dir = val,
            SettingUpdate::EmbeddingModel(val) => next.embedding_model = val,
            SettingUpdate::LlmModel(val) => next.llm_model = val,
            SettingUpdate::TopK(val) => next.top_k = val,
            SettingUpdate::ChunkSize(val) => next.chunk_size = val,
            SettingUpdate::ChunkOverlap(val) => next.chunk_overlap = val,
        }

        next.validate()?;
        return Ok(next);
    }
}
