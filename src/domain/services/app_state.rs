#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use tokio::sync::mpsc;

use super::Access;
use super::AccessGuard;
use super::IngestionWorkflow;
use super::QueryWorkflow;
use super::SessionStore;
use super::SettingsStore;
use crate::domain::models::Action;
use crate::domain::models::ClientError;
use crate::domain::models::Document;
use crate::domain::models::Event;
use crate::domain::models::HealthReport;
use crate::domain::models::SettingUpdate;
use crate::domain::models::View;

fn worker_stopped() -> ClientError {
    return ClientError::Setup("The background worker has stopped".to_string());
}

/// Everything the client knows, owned by a single task. Backend calls leave
/// as actions and come back as events, so all mutation happens here.
pub struct AppState {
    pub session: SessionStore,
    pub settings: SettingsStore,
    pub ingestion: IngestionWorkflow,
    pub query: QueryWorkflow,
    pub last_health: Option<Result<HealthReport, ClientError>>,
    view: View,
}

impl AppState {
    pub fn new(session: SessionStore, settings: SettingsStore) -> AppState {
        let view = if session.is_authenticated() {
            View::Chat
        } else {
            View::Login
        };

        return AppState {
            session,
            settings,
            ingestion: IngestionWorkflow::default(),
            query: QueryWorkflow::default(),
            last_health: None,
            view,
        };
    }

    pub fn view(&self) -> View {
        return self.view;
    }

    /// Moves to `view` when the guard allows it, otherwise to where the guard
    /// redirects. Returns the view that was entered.
    pub fn navigate(&mut self, view: View) -> View {
        match AccessGuard::evaluate(self.session.session(), view) {
            Access::Allow => self.view = view,
            Access::Deny { redirect } => self.view = redirect,
        }

        return self.view;
    }

    /// Re-checks access for a protected operation and returns the token to
    /// send with it.
    fn authorize(&mut self, view: View) -> Result<Option<String>, ClientError> {
        if let Access::Deny { redirect } = AccessGuard::evaluate(self.session.session(), view) {
            self.view = redirect;
            if self.session.session().is_none() {
                return Err(ClientError::Authentication(Some(
                    "Log in first".to_string(),
                )));
            }
            return Err(ClientError::Authentication(None));
        }

        return Ok(self.session.token().map(|e| return e.to_string()));
    }

    pub fn select_documents(&mut self, documents: Vec<Document>) -> Result<usize, ClientError> {
        self.authorize(View::Upload)?;
        return self.ingestion.select(documents);
    }

    pub fn remove_document(&mut self, idx: usize) -> Result<Option<Document>, ClientError> {
        self.authorize(View::Upload)?;
        return self.ingestion.remove(idx);
    }

    pub fn submit_documents(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<(), ClientError> {
        let token = self.authorize(View::Upload)?;
        let (documents, settings) = self.ingestion.submit(self.settings.get())?;

        if tx.send(Action::Ingest(token, documents, settings)).is_err() {
            self.ingestion.complete_submit(Err(worker_stopped()));
            return Err(worker_stopped());
        }

        return Ok(());
    }

    pub fn ask(&mut self, question: &str, tx: &mpsc::UnboundedSender<Action>) -> Result<(), ClientError> {
        let token = self.authorize(View::Chat)?;
        let question = self.query.ask(question)?;

        if tx
            .send(Action::Ask(token, question, self.settings.snapshot()))
            .is_err()
        {
            self.query.complete(Err(worker_stopped()));
            return Err(worker_stopped());
        }

        return Ok(());
    }

    pub fn clear_conversation(&mut self) {
        self.query.clear_conversation();
    }

    pub fn clear_knowledge_base(
        &mut self,
        confirmation: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<(), ClientError> {
        let token = self.authorize(View::Upload)?;
        self.ingestion.begin_clear(confirmation)?;

        if tx.send(Action::ClearKnowledgeBase(token)).is_err() {
            self.ingestion.complete_clear(Err(worker_stopped()));
            return Err(worker_stopped());
        }

        return Ok(());
    }

    /// Health is informational and available without a login.
    pub fn check_health(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<(), ClientError> {
        let token = self.session.token().map(|e| return e.to_string());
        if tx.send(Action::Health(token)).is_err() {
            self.last_health = Some(Err(worker_stopped()));
            return Err(worker_stopped());
        }

        return Ok(());
    }

    pub fn update_setting(&mut self, update: SettingUpdate) -> Result<(), ClientError> {
        self.authorize(View::Settings)?;
        return self.settings.update(update);
    }

    /// Applies a backend result. Returns true when the result ended the
    /// session, in which case the view is back on login. Health results are
    /// only recorded and never end the session.
    pub async fn handle_event(&mut self, event: Event) -> bool {
        let failure = match &event {
            Event::IngestFinished(Err(err))
            | Event::AnswerReceived(Err(err))
            | Event::KnowledgeBaseCleared(Err(err)) => Some(err.clone()),
            _ => None,
        };

        match event {
            Event::IngestFinished(res) => self.ingestion.complete_submit(res),
            Event::AnswerReceived(res) => self.query.complete(res),
            Event::KnowledgeBaseCleared(res) => {
                let cleared = res.is_ok();
                self.ingestion.complete_clear(res);
                if cleared {
                    self.query.clear_conversation();
                }
            }
            Event::HealthChecked(res) => self.last_health = Some(res),
        }

        if let Some(err) = failure {
            if self.session.handle_failure(&err).await {
                self.view = View::Login;
                return true;
            }
        }

        return false;
    }
}
