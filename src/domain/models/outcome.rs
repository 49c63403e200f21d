/// Result of the most recent ingestion or knowledge-base clear. Replaced
/// wholesale by the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success {
        message: String,
        storage_location: Option<String>,
    },
    Failure {
        reason: String,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        return matches!(self, Outcome::Success { .. });
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Success { message, .. } => return message,
            Outcome::Failure { reason } => return reason,
        }
    }
}
