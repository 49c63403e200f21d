use super::Document;
use super::Settings;

/// Requests handed to the actions worker. Each carries the bearer token that
/// was current when it was dispatched.
pub enum Action {
    Ingest(Option<String>, Vec<Document>, Settings),
    Ask(Option<String>, String, Settings),
    ClearKnowledgeBase(Option<String>),
    Health(Option<String>),
}
