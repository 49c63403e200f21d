#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::GatewayRef;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /upload (/u) [PATH...] - Selects PDF files for the next upload. Anything that isn't a PDF is skipped.
- /files (/f) - Lists the selected files.
- /remove (/rm) [FILE_NUMBER] - Removes a file from the selection, using the number from /files.
- /submit (/s, /ingest) - Uploads the selected files to the knowledge base.
- /drop - Empties the selection.
- /settings - Shows the current processing settings.
- /set [KEY] [VALUE] - Changes a setting for this session. Keys: persist-dir, embedding-model, llm-model, top-k, chunk-size, chunk-overlap.
- /clear (/c) - Clears the conversation. Nothing is sent to the backend.
- /clearkb (/clear-kb) - Deletes everything stored in the knowledge base. You'll be asked to type DELETE to confirm.
- /health - Checks whether the backend is running.
- /logout - Logs out and removes stored credentials.
- /quit /exit (/q) - Exit BillyBot.
- /help (/h) - Provides this help menu.

Anything else you type is asked as a question against your documents.
        "#;

    return text.trim().to_string();
}

async fn run(gateway: GatewayRef, action: Action) -> Event {
    match action {
        Action::Ingest(token, documents, settings) => {
            let res = gateway
                .ingest_documents(token.as_deref(), documents, &settings)
                .await;
            return Event::IngestFinished(res);
        }
        Action::Ask(token, question, settings) => {
            let res = gateway
                .answer_question(token.as_deref(), &question, &settings)
                .await;
            return Event::AnswerReceived(res);
        }
        Action::ClearKnowledgeBase(token) => {
            let res = gateway.clear_knowledge_base(token.as_deref()).await;
            return Event::KnowledgeBaseCleared(res);
        }
        Action::Health(token) => {
            let res = gateway.health(token.as_deref()).await;
            return Event::HealthChecked(res);
        }
    }
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs every action against the gateway on its own task and reports the
    /// result as an event. Returns once the action channel is closed.
    pub async fn start(
        gateway: GatewayRef,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        while let Some(action) = rx.recv().await {
            let worker_gateway = gateway.clone();
            let worker_tx = tx.clone();

            tokio::spawn(async move {
                let event = run(worker_gateway, action).await;
                if worker_tx.send(event).is_err() {
                    tracing::warn!("Dropping backend result, nobody is listening");
                }
            });
        }

        tracing::debug!("Action channel closed, stopping worker");
        return Ok(());
    }
}
