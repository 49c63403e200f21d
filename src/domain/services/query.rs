#[cfg(test)]
#[path = "query_test.rs"]
mod tests;

use crate::domain::models::Answer;
use crate::domain::models::ClientError;
use crate::domain::models::Conversation;
use crate::domain::models::Turn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Asking,
}

/// Question and answer lifecycle. One question may be in flight at a time,
/// which keeps every answer directly after its question.
pub struct QueryWorkflow {
    conversation: Conversation,
    state: QueryState,
}

impl Default for QueryWorkflow {
    fn default() -> QueryWorkflow {
        return QueryWorkflow {
            conversation: Conversation::default(),
            state: QueryState::Idle,
        };
    }
}

impl QueryWorkflow {
    pub fn state(&self) -> QueryState {
        return self.state;
    }

    pub fn conversation(&self) -> &Conversation {
        return &self.conversation;
    }

    /// Records the question and returns the trimmed text to dispatch.
    pub fn ask(&mut self, question: &str) -> Result<String, ClientError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ClientError::Validation("Type a question first".to_string()));
        }
        if self.state == QueryState::Asking {
            return Err(ClientError::Busy(
                "Still waiting for the previous answer".to_string(),
            ));
        }

        self.conversation.push(Turn::user(question));
        self.state = QueryState::Asking;

        return Ok(question.to_string());
    }

    pub fn complete(&mut self, result: Result<Answer, ClientError>) {
        if self.state != QueryState::Asking {
            tracing::warn!("Answer arrived with no question in flight");
        }
        self.state = QueryState::Idle;

        match result {
            Ok(answer) => self.conversation.push(Turn::assistant(&answer.text)),
            Err(err) => {
                tracing::error!(error = ?err, "Question failed");
                let text = format!("Error: {}", err.user_message("Failed to get response"));
                self.conversation.push(Turn::assistant_error(&text));
            }
        }
    }

    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
    }
}
