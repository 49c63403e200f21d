use super::Answer;
use super::ClearReceipt;
use super::ClientError;
use super::HealthReport;
use super::IngestReceipt;

pub enum Event {
    IngestFinished(Result<IngestReceipt, ClientError>),
    AnswerReceived(Result<Answer, ClientError>),
    KnowledgeBaseCleared(Result<ClearReceipt, ClientError>),
    HealthChecked(Result<HealthReport, ClientError>),
}
