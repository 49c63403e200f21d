use std::sync::Arc;

use async_trait::async_trait;

use super::ClientError;
use super::Document;
use super::Settings;
use super::UserProfile;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub confirmation: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestReceipt {
    pub message: String,
    pub storage_location: Option<String>,
    pub files_processed: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClearReceipt {
    pub message: String,
    pub cleared_locations: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    pub message: Option<String>,
}

pub type GatewayRef = Arc<dyn Gateway + Send + Sync>;

/// The only boundary between the client and the knowledge base backend.
///
/// Every call takes the bearer token current at dispatch time. When it is
/// `Some`, implementations must attach it as an `Authorization: Bearer`
/// header, and omit the header otherwise.
#[async_trait]
pub trait Gateway {
    /// Liveness probe. Never used to block a user action.
    async fn health(&self, token: Option<&str>) -> Result<HealthReport, ClientError>;

    /// Exchanges credentials for a token. Any 4xx is reported as
    /// [`ClientError::Authentication`], as is a success without a token.
    async fn authenticate(
        &self,
        token: Option<&str>,
        identifier: &str,
        secret: &str,
    ) -> Result<Credentials, ClientError>;

    async fn register(
        &self,
        token: Option<&str>,
        identifier: &str,
        secret: &str,
        username: Option<&str>,
    ) -> Result<Registration, ClientError>;

    async fn current_user(&self, token: Option<&str>) -> Result<UserProfile, ClientError>;

    /// Uploads raw document bytes together with a settings snapshot. Uses an
    /// extended timeout. An empty document list fails validation without any
    /// network call.
    async fn ingest_documents(
        &self,
        token: Option<&str>,
        documents: Vec<Document>,
        settings: &Settings,
    ) -> Result<IngestReceipt, ClientError>;

    /// A blank question fails validation without any network call.
    async fn answer_question(
        &self,
        token: Option<&str>,
        question: &str,
        settings: &Settings,
    ) -> Result<Answer, ClientError>;

    /// Destructive. Callers are responsible for obtaining confirmation.
    async fn clear_knowledge_base(&self, token: Option<&str>)
        -> Result<ClearReceipt, ClientError>;
}
