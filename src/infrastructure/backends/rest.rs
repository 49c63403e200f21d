#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::RequestBuilder;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Answer;
use crate::domain::models::ClearReceipt;
use crate::domain::models::ClientError;
use crate::domain::models::Credentials;
use crate::domain::models::Document;
use crate::domain::models::Gateway;
use crate::domain::models::HealthReport;
use crate::domain::models::IngestReceipt;
use crate::domain::models::Registration;
use crate::domain::models::Settings;
use crate::domain::models::UserProfile;

/// Uploads carry whole PDFs, so they never get less than this.
pub const MIN_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct LoginResponse {
    #[serde(alias = "access_token")]
    token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct RegisterResponse {
    #[serde(alias = "message")]
    confirmation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct MeResponse {
    #[serde(alias = "email")]
    identifier: String,
    #[serde(rename = "displayName", alias = "username", alias = "display_name")]
    display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct UploadResponse {
    message: String,
    #[serde(
        rename = "storageLocation",
        alias = "persistDir",
        alias = "storage_location"
    )]
    storage_location: Option<String>,
    files_processed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
    settings: &'a Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct AskResponse {
    #[serde(alias = "answerText")]
    answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct ClearResponse {
    message: String,
    #[serde(default, rename = "clearedLocations", alias = "cleared_locations")]
    cleared_locations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct HealthResponse {
    status: String,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

/// How a 4xx answer should be read.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Rejection {
    /// Login and registration: every 4xx means the credentials were refused.
    Credentials,
    /// Everything else: only 401/403 mean the token was refused.
    Bearer,
}

/// Pulls a human readable reason out of an error body. Understands plain
/// `{"detail": "..."}`, FastAPI validation arrays and `{"message": "..."}`.
fn error_detail(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok()?;

    match parsed.detail {
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => {
            return Some(text);
        }
        Some(serde_json::Value::Array(items)) => {
            let msgs = items
                .iter()
                .filter_map(|item| {
                    return item
                        .get("msg")
                        .and_then(|e| return e.as_str())
                        .map(|e| return e.to_string());
                })
                .collect::<Vec<String>>();
            if !msgs.is_empty() {
                return Some(msgs.join("; "));
            }
        }
        _ => (),
    }

    return parsed.message.filter(|e| return !e.trim().is_empty());
}

fn send_error(err: reqwest::Error) -> ClientError {
    if err.is_builder() {
        return ClientError::Setup(err.to_string());
    }

    tracing::error!(error = ?err, "Backend is not reachable");
    return ClientError::Transport(err.to_string());
}

async fn read_json<T: DeserializeOwned>(
    req: RequestBuilder,
    rejection: Rejection,
) -> Result<T, ClientError> {
    let res = req.send().await.map_err(send_error)?;
    let status = res.status();
    let body = res.text().await.map_err(send_error)?;

    if !status.is_success() {
        let detail = error_detail(&body);
        tracing::error!(status = status.as_u16(), detail = ?detail, "Backend request failed");

        let refused = status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN;
        if refused || (rejection == Rejection::Credentials && status.is_client_error()) {
            return Err(ClientError::Authentication(detail));
        }

        return Err(ClientError::Backend {
            status: status.as_u16(),
            detail,
        });
    }

    return serde_json::from_str::<T>(&body).map_err(|err| {
        tracing::error!(error = ?err, body, "Backend returned an unexpected body");
        return ClientError::Backend {
            status: status.as_u16(),
            detail: Some(format!("Unexpected response from backend: {err}")),
        };
    });
}

fn with_token(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    if let Some(token) = token {
        return req.bearer_auth(token);
    }

    return req;
}

pub struct RestGateway {
    url: String,
    timeout: Duration,
    upload_timeout: Duration,
    client: reqwest::Client,
}

impl RestGateway {
    pub fn new(url: &str, timeout: Duration, upload_timeout: Duration) -> RestGateway {
        return RestGateway {
            url: url.trim_end_matches('/').to_string(),
            timeout,
            upload_timeout: upload_timeout.max(MIN_UPLOAD_TIMEOUT),
            client: reqwest::Client::new(),
        };
    }

    pub fn from_config() -> Result<RestGateway> {
        let timeout = Config::get(ConfigKey::BackendTimeout)
            .parse::<u64>()
            .context("backend-timeout must be a number of milliseconds")?;
        let upload_timeout = Config::get(ConfigKey::UploadTimeout)
            .parse::<u64>()
            .context("upload-timeout must be a number of milliseconds")?;

        return Ok(RestGateway::new(
            &Config::get(ConfigKey::BackendURL),
            Duration::from_millis(timeout),
            Duration::from_millis(upload_timeout),
        ));
    }

    pub fn upload_timeout(&self) -> Duration {
        return self.upload_timeout;
    }
}

#[async_trait]
impl Gateway for RestGateway {
    #[allow(clippy::implicit_return)]
    async fn health(&self, token: Option<&str>) -> Result<HealthReport, ClientError> {
        let req = self
            .client
            .get(format!("{url}/health", url = self.url))
            .timeout(self.timeout);
        let res = read_json::<HealthResponse>(with_token(req, token), Rejection::Bearer).await?;

        return Ok(HealthReport {
            status: res.status,
            message: res.message,
        });
    }

    #[allow(clippy::implicit_return)]
    async fn authenticate(
        &self,
        token: Option<&str>,
        identifier: &str,
        secret: &str,
    ) -> Result<Credentials, ClientError> {
        let req = self
            .client
            .post(format!("{url}/login", url = self.url))
            .timeout(self.timeout)
            .json(&CredentialsRequest {
                email: identifier,
                password: secret,
                username: None,
            });
        let res = read_json::<LoginResponse>(with_token(req, token), Rejection::Credentials).await?;

        match res.token {
            Some(token) if !token.is_empty() => return Ok(Credentials { token }),
            _ => {
                tracing::error!("Login succeeded without a token");
                return Err(ClientError::Authentication(Some(
                    "The backend did not return a token".to_string(),
                )));
            }
        }
    }

    #[allow(clippy::implicit_return)]
    async fn register(
        &self,
        token: Option<&str>,
        identifier: &str,
        secret: &str,
        username: Option<&str>,
    ) -> Result<Registration, ClientError> {
        let req = self
            .client
            .post(format!("{url}/register", url = self.url))
            .timeout(self.timeout)
            .json(&CredentialsRequest {
                email: identifier,
                password: secret,
                username,
            });
        let res =
            read_json::<RegisterResponse>(with_token(req, token), Rejection::Credentials).await?;

        return Ok(Registration {
            confirmation: res
                .confirmation
                .unwrap_or_else(|| return "Registration successful".to_string()),
        });
    }

    #[allow(clippy::implicit_return)]
    async fn current_user(&self, token: Option<&str>) -> Result<UserProfile, ClientError> {
        let req = self
            .client
            .get(format!("{url}/me", url = self.url))
            .timeout(self.timeout);
        let res = read_json::<MeResponse>(with_token(req, token), Rejection::Bearer).await?;

        let display_name = res
            .display_name
            .filter(|e| return !e.is_empty())
            .unwrap_or_else(|| return res.identifier.to_string());

        return Ok(UserProfile {
            identifier: res.identifier,
            display_name,
        });
    }

    #[allow(clippy::implicit_return)]
    async fn ingest_documents(
        &self,
        token: Option<&str>,
        documents: Vec<Document>,
        settings: &Settings,
    ) -> Result<IngestReceipt, ClientError> {
        if documents.is_empty() {
            return Err(ClientError::Validation(
                "Select at least one PDF to upload".to_string(),
            ));
        }

        let count = documents.len();
        let mut form = multipart::Form::new();
        for document in documents {
            let part = multipart::Part::bytes(document.bytes)
                .file_name(document.name)
                .mime_str(&document.media_type)
                .map_err(|err| return ClientError::Setup(err.to_string()))?;
            form = form.part("files", part);
        }

        let settings_json =
            serde_json::to_string(settings).map_err(|err| return ClientError::Setup(err.to_string()))?;
        form = form.text("settings", settings_json);

        tracing::debug!(
            files = count,
            persist_dir = settings.persist_dir,
            "Uploading documents"
        );

        let req = self
            .client
            .post(format!("{url}/upload", url = self.url))
            .timeout(self.upload_timeout)
            .multipart(form);
        let res = read_json::<UploadResponse>(with_token(req, token), Rejection::Bearer).await?;

        return Ok(IngestReceipt {
            message: res.message,
            storage_location: res.storage_location,
            files_processed: res.files_processed,
        });
    }

    #[allow(clippy::implicit_return)]
    async fn answer_question(
        &self,
        token: Option<&str>,
        question: &str,
        settings: &Settings,
    ) -> Result<Answer, ClientError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ClientError::Validation(
                "Type a question first".to_string(),
            ));
        }

        tracing::debug!(question, top_k = settings.top_k, "Asking question");

        let req = self
            .client
            .post(format!("{url}/ask", url = self.url))
            .timeout(self.timeout)
            .json(&AskRequest { question, settings });
        let res = read_json::<AskResponse>(with_token(req, token), Rejection::Bearer).await?;

        return Ok(Answer { text: res.answer });
    }

    #[allow(clippy::implicit_return)]
    async fn clear_knowledge_base(
        &self,
        token: Option<&str>,
    ) -> Result<ClearReceipt, ClientError> {
        let req = self
            .client
            .delete(format!("{url}/clear-database", url = self.url))
            .timeout(self.timeout);
        let res = read_json::<ClearResponse>(with_token(req, token), Rejection::Bearer).await?;

        return Ok(ClearReceipt {
            message: res.message,
            cleared_locations: res.cleared_locations,
        });
    }
}
