#[cfg(test)]
#[path = "ingestion_test.rs"]
mod tests;

use crate::domain::models::ClearReceipt;
use crate::domain::models::ClientError;
use crate::domain::models::Document;
use crate::domain::models::DocumentBatch;
use crate::domain::models::IngestReceipt;
use crate::domain::models::Outcome;
use crate::domain::models::Settings;

/// Text the user must type before the knowledge base is wiped.
pub const CLEAR_CONFIRMATION: &str = "DELETE";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestionState {
    Idle,
    Ready,
    Submitting,
}

/// Document selection and upload lifecycle, plus the knowledge-base clear
/// which can run independently of it.
#[derive(Default)]
pub struct IngestionWorkflow {
    batch: DocumentBatch,
    outcome: Option<Outcome>,
    submitting: Option<String>,
    clearing: bool,
}

impl IngestionWorkflow {
    pub fn state(&self) -> IngestionState {
        if self.submitting.is_some() {
            return IngestionState::Submitting;
        }
        if self.batch.is_empty() {
            return IngestionState::Idle;
        }

        return IngestionState::Ready;
    }

    pub fn batch(&self) -> &DocumentBatch {
        return &self.batch;
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        return self.outcome.as_ref();
    }

    pub fn is_clearing(&self) -> bool {
        return self.clearing;
    }

    fn ensure_not_submitting(&self) -> Result<(), ClientError> {
        if self.submitting.is_some() {
            return Err(ClientError::Busy(
                "An upload is already in progress".to_string(),
            ));
        }

        return Ok(());
    }

    pub fn select(&mut self, documents: Vec<Document>) -> Result<usize, ClientError> {
        self.ensure_not_submitting()?;

        let offered = documents.len();
        let accepted = self.batch.add(documents);
        self.outcome = None;

        tracing::debug!(offered, accepted, total = self.batch.len(), "Documents selected");
        return Ok(accepted);
    }

    /// Out of range positions are ignored.
    pub fn remove(&mut self, idx: usize) -> Result<Option<Document>, ClientError> {
        self.ensure_not_submitting()?;
        return Ok(self.batch.remove(idx));
    }

    pub fn clear_selection(&mut self) -> Result<(), ClientError> {
        self.ensure_not_submitting()?;
        self.batch.clear();
        self.outcome = None;

        return Ok(());
    }

    /// Moves to `Submitting` and hands back what should be uploaded. The batch
    /// stays in place so a failed upload can be retried.
    pub fn submit(&mut self, settings: &Settings) -> Result<(Vec<Document>, Settings), ClientError> {
        self.ensure_not_submitting()?;
        if self.clearing {
            return Err(ClientError::Busy(
                "The knowledge base is being cleared".to_string(),
            ));
        }
        if self.batch.is_empty() {
            return Err(ClientError::Validation(
                "Select at least one PDF to upload".to_string(),
            ));
        }

        self.submitting = Some(settings.persist_dir.to_string());
        tracing::debug!(documents = self.batch.len(), "Submitting documents");

        return Ok((self.batch.documents().to_vec(), settings.clone()));
    }

    pub fn complete_submit(&mut self, result: Result<IngestReceipt, ClientError>) {
        let persist_dir = match self.submitting.take() {
            Some(persist_dir) => persist_dir,
            None => {
                tracing::warn!("Upload result arrived with no upload in flight");
                return;
            }
        };

        match result {
            Ok(receipt) => {
                tracing::debug!(files_processed = ?receipt.files_processed, "Upload finished");
                self.batch.clear();
                self.outcome = Some(Outcome::Success {
                    message: receipt.message,
                    storage_location: receipt.storage_location.or(Some(persist_dir)),
                });
            }
            Err(err) => {
                tracing::error!(error = ?err, "Upload failed");
                self.outcome = Some(Outcome::Failure {
                    reason: err.user_message("Upload failed"),
                });
            }
        }
    }

    pub fn begin_clear(&mut self, confirmation: &str) -> Result<(), ClientError> {
        self.ensure_not_submitting()?;
        if self.clearing {
            return Err(ClientError::Busy(
                "The knowledge base is already being cleared".to_string(),
            ));
        }
        if confirmation.trim() != CLEAR_CONFIRMATION {
            return Err(ClientError::Validation(format!(
                "Type {CLEAR_CONFIRMATION} to confirm clearing the knowledge base"
            )));
        }

        self.clearing = true;
        return Ok(());
    }

    pub fn complete_clear(&mut self, result: Result<ClearReceipt, ClientError>) {
        if !self.clearing {
            tracing::warn!("Clear result arrived with no clear in flight");
            return;
        }
        self.clearing = false;

        match result {
            Ok(receipt) => {
                let storage_location = if receipt.cleared_locations.is_empty() {
                    None
                } else {
                    Some(receipt.cleared_locations.join(", "))
                };
                self.outcome = Some(Outcome::Success {
                    message: receipt.message,
                    storage_location,
                });
            }
            Err(err) => {
                tracing::error!(error = ?err, "Clearing the knowledge base failed");
                self.outcome = Some(Outcome::Failure {
                    reason: err.user_message("Failed to clear knowledge base"),
                });
            }
        }
    }
}
