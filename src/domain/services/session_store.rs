#[cfg(test)]
#[path = "session_store_test.rs"]
mod tests;

use anyhow::Result;

use super::TokenStorage;
use crate::domain::models::ClientError;
use crate::domain::models::Gateway;
use crate::domain::models::Registration;
use crate::domain::models::Session;

fn validate_credentials(identifier: &str, secret: &str) -> Result<(), ClientError> {
    if identifier.trim().is_empty() {
        return Err(ClientError::Validation("Email is required".to_string()));
    }
    if secret.is_empty() {
        return Err(ClientError::Validation("Password is required".to_string()));
    }

    return Ok(());
}

/// Sole owner of the authenticated identity. Storage is only written on
/// login and logout.
pub struct SessionStore {
    session: Option<Session>,
    storage: TokenStorage,
}

impl SessionStore {
    pub fn new(storage: TokenStorage) -> SessionStore {
        return SessionStore {
            session: None,
            storage,
        };
    }

    pub fn session(&self) -> Option<&Session> {
        return self.session.as_ref();
    }

    pub fn is_authenticated(&self) -> bool {
        return self
            .session
            .as_ref()
            .map(|e| return e.is_authenticated())
            .unwrap_or(false);
    }

    pub fn token(&self) -> Option<&str> {
        return self
            .session
            .as_ref()
            .filter(|e| return e.is_authenticated())
            .map(|e| return e.token());
    }

    /// Rebuilds a provisional session from a stored token. The session counts
    /// as authenticated until a backend call rejects it.
    pub async fn restore(&mut self) -> Result<bool> {
        let token = self.storage.load().await?;
        if let Some(token) = token {
            tracing::debug!("Restored stored credentials");
            self.session = Some(Session::restored(&token));
            return Ok(true);
        }

        return Ok(false);
    }

    pub async fn login(
        &mut self,
        gateway: &(dyn Gateway + Send + Sync),
        identifier: &str,
        secret: &str,
    ) -> Result<&Session, ClientError> {
        validate_credentials(identifier, secret)?;
        let identifier = identifier.trim();

        let current = self.token().map(|e| return e.to_string());
        let credentials = gateway
            .authenticate(current.as_deref(), identifier, secret)
            .await?;
        self.session = Some(Session::new(identifier, identifier, &credentials.token));

        if let Err(err) = self.storage.save(&credentials.token).await {
            tracing::warn!(error = ?err, "Unable to persist credentials, login lasts for this run only");
        }

        match gateway.current_user(Some(&credentials.token)).await {
            Ok(profile) => {
                if let Some(session) = self.session.as_mut() {
                    session.apply_profile(profile);
                }
            }
            Err(err) if err.is_authentication() => {
                self.logout().await;
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(error = ?err, "Unable to load profile, using login identifier");
            }
        }

        tracing::debug!(subject = identifier, "Logged in");
        return self
            .session
            .as_ref()
            .ok_or_else(|| return ClientError::Authentication(None));
    }

    pub async fn logout(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("Logged out");
        }

        if let Err(err) = self.storage.clear().await {
            tracing::warn!(error = ?err, "Unable to remove stored credentials");
        }
    }

    /// Confirms the current token with the backend and refreshes the
    /// identity. A rejected token logs the user out.
    pub async fn verify(&mut self, gateway: &(dyn Gateway + Send + Sync)) -> Result<&Session, ClientError> {
        let token = match self.token() {
            Some(token) => token.to_string(),
            None => return Err(ClientError::Authentication(None)),
        };

        match gateway.current_user(Some(&token)).await {
            Ok(profile) => {
                if let Some(session) = self.session.as_mut() {
                    session.apply_profile(profile);
                }
            }
            Err(err) => {
                self.handle_failure(&err).await;
                return Err(err);
            }
        }

        return self
            .session
            .as_ref()
            .ok_or_else(|| return ClientError::Authentication(None));
    }

    /// Applies the implicit logout policy to a gateway failure. Returns true
    /// when the session was dropped.
    pub async fn handle_failure(&mut self, err: &ClientError) -> bool {
        if !err.is_authentication() || self.session.is_none() {
            return false;
        }

        tracing::warn!(error = ?err, "Backend rejected the session");
        self.logout().await;
        return true;
    }

    pub async fn register(
        &self,
        gateway: &(dyn Gateway + Send + Sync),
        identifier: &str,
        secret: &str,
        username: Option<&str>,
    ) -> Result<Registration, ClientError> {
        validate_credentials(identifier, secret)?;
        let username = username
            .map(|e| return e.trim())
            .filter(|e| return !e.is_empty());

        return gateway
            .register(self.token(), identifier.trim(), secret, username)
            .await;
    }
}
