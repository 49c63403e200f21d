use std::net::TcpListener;
use std::time::Duration;

use anyhow::Result;
use mockito::Matcher;
use serde_json::json;
use test_utils::pdf_fixture;

use super::error_detail;
use super::RestGateway;
use super::MIN_UPLOAD_TIMEOUT;
use crate::domain::models::ClientError;
use crate::domain::models::Document;
use crate::domain::models::Gateway;
use crate::domain::models::Settings;

impl RestGateway {
    fn with_url(url: String) -> RestGateway {
        return RestGateway::new(
            &url,
            Duration::from_millis(2000),
            Duration::from_millis(2000),
        );
    }
}

#[tokio::test]
async fn it_successfully_health_checks() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(json!({"status": "healthy", "message": "BillyBot API is running"}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.health(None).await?;

    assert_eq!(res.status, "healthy");
    assert_eq!(res.message, Some("BillyBot API is running".to_string()));
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .with_status(500)
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.health(None).await;

    assert_eq!(
        res,
        Err(ClientError::Backend {
            status: 500,
            detail: None
        })
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn it_reports_unreachable_backends_as_transport() {
    let gateway = RestGateway::with_url("http://127.0.0.1:1".to_string());
    let res = gateway.health(None).await;

    assert!(matches!(res, Err(ClientError::Transport(_))));
}

#[tokio::test]
async fn it_times_out_as_transport() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}", listener.local_addr()?);

    let gateway = RestGateway::new(
        &url,
        Duration::from_millis(100),
        Duration::from_millis(100),
    );
    let res = gateway.health(None).await;

    assert!(matches!(res, Err(ClientError::Transport(_))));
    drop(listener);
    return Ok(());
}

#[tokio::test]
async fn it_sends_the_token_with_health_checks() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .match_header("authorization", "Bearer abc")
        .with_status(200)
        .with_body(json!({"status": "healthy"}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.health(Some("abc")).await?;

    assert_eq!(res.status, "healthy");
    assert_eq!(res.message, None);
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_authenticates() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/login")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({
            "email": "ok@x.com",
            "password": "right",
        })))
        .with_status(200)
        .with_body(json!({"access_token": "abc", "token_type": "bearer"}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.authenticate(None, "ok@x.com", "right").await?;

    assert_eq!(res.token, "abc");
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_rejects_bad_credentials() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/login")
        .with_status(401)
        .with_body(json!({"detail": "Incorrect email or password"}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.authenticate(None, "bad@x.com", "wrong").await;

    assert_eq!(
        res,
        Err(ClientError::Authentication(Some(
            "Incorrect email or password".to_string()
        )))
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn it_treats_a_missing_token_as_rejection() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/login")
        .with_status(200)
        .with_body(json!({"token": ""}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.authenticate(None, "ok@x.com", "right").await;

    assert!(matches!(res, Err(ClientError::Authentication(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn it_reports_login_server_errors_as_backend() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/login")
        .with_status(503)
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.authenticate(None, "ok@x.com", "right").await;

    assert!(matches!(
        res,
        Err(ClientError::Backend { status: 503, .. })
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn it_registers() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/register")
        .match_body(Matcher::Json(json!({
            "email": "new@x.com",
            "password": "secret",
            "username": "newbie",
        })))
        .with_status(200)
        .with_body(json!({"message": "User created"}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway
        .register(None, "new@x.com", "secret", Some("newbie"))
        .await?;

    assert_eq!(res.confirmation, "User created");
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_rejects_duplicate_registration() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/register")
        .with_status(400)
        .with_body(json!({"detail": "Email already registered"}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.register(None, "new@x.com", "secret", None).await;

    assert_eq!(
        res,
        Err(ClientError::Authentication(Some(
            "Email already registered".to_string()
        )))
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn it_gets_the_current_user() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/me")
        .match_header("authorization", "Bearer abc")
        .with_status(200)
        .with_body(json!({"email": "ok@x.com", "username": "Billy"}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.current_user(Some("abc")).await?;

    assert_eq!(res.identifier, "ok@x.com");
    assert_eq!(res.display_name, "Billy");
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_reports_expired_tokens() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/me")
        .with_status(401)
        .with_body(json!({"detail": "Could not validate credentials"}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.current_user(Some("stale")).await;

    assert!(res.unwrap_err().is_authentication());
    mock.assert_async().await;
}

#[tokio::test]
async fn it_uploads_documents_with_settings() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .match_header("authorization", "Bearer abc")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="files"; filename="handbook.pdf""#.to_string()),
            Matcher::Regex(r#"name="files"; filename="benefits.pdf""#.to_string()),
            Matcher::Regex("%PDF-1.4".to_string()),
            Matcher::Regex(r#"name="settings""#.to_string()),
            Matcher::Regex(r#""persistDir":"chroma_kb_db""#.to_string()),
            Matcher::Regex(r#""topK":4"#.to_string()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "message": "Successfully ingested 2 files into Chroma database",
                "files_processed": 2,
            })
            .to_string(),
        )
        .create_async()
        .await;

    let documents = vec![
        Document::from_file_name("handbook.pdf", pdf_fixture()),
        Document::from_file_name("benefits.pdf", pdf_fixture()),
    ];

    let gateway = RestGateway::with_url(server.url());
    let res = gateway
        .ingest_documents(Some("abc"), documents, &Settings::default())
        .await?;

    assert_eq!(
        res.message,
        "Successfully ingested 2 files into Chroma database"
    );
    assert_eq!(res.files_processed, Some(2));
    assert_eq!(res.storage_location, None);
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_rejects_empty_uploads_locally() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .expect(0)
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway
        .ingest_documents(Some("abc"), vec![], &Settings::default())
        .await;

    assert!(matches!(res, Err(ClientError::Validation(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn it_reports_unsendable_uploads_as_setup() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .expect(0)
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway
        .ingest_documents(
            Some("abc"),
            vec![Document::new("a.pdf", "not a media type", pdf_fixture())],
            &Settings::default(),
        )
        .await;

    assert!(matches!(res, Err(ClientError::Setup(_))));
    assert_eq!(res.unwrap_err().user_message("Upload failed"), "Upload failed");
    mock.assert_async().await;
}

#[tokio::test]
async fn it_surfaces_upload_detail() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .with_status(500)
        .with_body(json!({"detail": "Ollama embedding model not found"}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway
        .ingest_documents(
            None,
            vec![Document::from_file_name("a.pdf", pdf_fixture())],
            &Settings::default(),
        )
        .await;

    assert_eq!(
        res.unwrap_err().user_message("Upload failed"),
        "Ollama embedding model not found"
    );
    mock.assert_async().await;
}

#[test]
fn it_never_shortens_upload_timeout_below_a_minute() {
    let gateway = RestGateway::with_url("http://localhost:8000".to_string());
    assert_eq!(gateway.upload_timeout(), MIN_UPLOAD_TIMEOUT);

    let gateway = RestGateway::new(
        "http://localhost:8000/",
        Duration::from_secs(1),
        Duration::from_secs(300),
    );
    assert_eq!(gateway.upload_timeout(), Duration::from_secs(300));
    assert_eq!(gateway.url, "http://localhost:8000");
}

#[tokio::test]
async fn it_answers_questions() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ask")
        .match_header("authorization", "Bearer abc")
        .match_body(Matcher::PartialJson(json!({
            "question": "What is the remote work policy?",
            "settings": {"topK": 4, "llmModel": "llama3"},
        })))
        .with_status(200)
        .with_body(
            json!({
                "answer": "Employees may work remotely two days a week.",
                "question": "What is the remote work policy?",
            })
            .to_string(),
        )
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway
        .answer_question(
            Some("abc"),
            "  What is the remote work policy?  ",
            &Settings::default(),
        )
        .await?;

    assert_eq!(res.text, "Employees may work remotely two days a week.");
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_never_sends_blank_questions() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", "/ask").expect(0).create_async().await;

    let gateway = RestGateway::with_url(server.url());
    for question in ["", "   ", "\n\t"] {
        let res = gateway
            .answer_question(None, question, &Settings::default())
            .await;
        assert!(matches!(res, Err(ClientError::Validation(_))));
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn it_omits_authorization_without_a_token() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ask")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(json!({"answerText": "42"}).to_string())
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway
        .answer_question(None, "Meaning of life?", &Settings::default())
        .await?;

    assert_eq!(res.text, "42");
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_reports_malformed_success_bodies() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ask")
        .with_status(200)
        .with_body("<html>proxy error</html>")
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway
        .answer_question(None, "Anyone there?", &Settings::default())
        .await;

    assert!(matches!(res, Err(ClientError::Backend { status: 200, .. })));
    mock.assert_async().await;
}

#[tokio::test]
async fn it_clears_the_knowledge_base() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/clear-database")
        .match_header("authorization", "Bearer abc")
        .with_status(200)
        .with_body(
            json!({
                "message": "Knowledge base cleared successfully",
                "clearedLocations": ["chroma_kb_db", "chroma_hr_db"],
            })
            .to_string(),
        )
        .create_async()
        .await;

    let gateway = RestGateway::with_url(server.url());
    let res = gateway.clear_knowledge_base(Some("abc")).await?;

    assert_eq!(res.message, "Knowledge base cleared successfully");
    assert_eq!(res.cleared_locations, vec!["chroma_kb_db", "chroma_hr_db"]);
    mock.assert_async().await;
    return Ok(());
}

#[test]
fn it_extracts_error_detail() {
    assert_eq!(
        error_detail(r#"{"detail": "No database loaded. Please upload files first."}"#),
        Some("No database loaded. Please upload files first.".to_string())
    );
    assert_eq!(
        error_detail(
            r#"{"detail": [{"loc": ["body", "email"], "msg": "field required"}, {"msg": "value is not a valid email"}]}"#
        ),
        Some("field required; value is not a valid email".to_string())
    );
    assert_eq!(
        error_detail(r#"{"message": "Registration failed"}"#),
        Some("Registration failed".to_string())
    );
    assert_eq!(error_detail(r#"{"detail": ""}"#), None);
    assert_eq!(error_detail("Internal Server Error"), None);
}
