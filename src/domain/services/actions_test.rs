use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use mockito::Matcher;
use serde_json::json;
use tokio::sync::mpsc;

use super::help_text;
use super::ActionsService;
use crate::domain::models::Action;
use crate::domain::models::ClientError;
use crate::domain::models::Event;
use crate::domain::models::GatewayRef;
use crate::domain::models::Settings;
use crate::infrastructure::backends::RestGateway;

fn gateway(url: String) -> GatewayRef {
    return Arc::new(RestGateway::new(
        &url,
        Duration::from_millis(2000),
        Duration::from_millis(2000),
    ));
}

#[tokio::test]
async fn it_reports_each_action_as_an_event() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let health_mock = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(json!({"status": "healthy"}).to_string())
        .create_async()
        .await;
    let ask_mock = server
        .mock("POST", "/ask")
        .match_header("authorization", "Bearer abc")
        .match_body(Matcher::PartialJson(json!({"question": "Who?"})))
        .with_status(200)
        .with_body(json!({"answer": "Billy."}).to_string())
        .create_async()
        .await;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let gateway = gateway(server.url());
    let worker = tokio::spawn(async move {
        return ActionsService::start(gateway, event_tx, &mut action_rx).await;
    });

    action_tx.send(Action::Health(None))?;
    match event_rx.recv().await {
        Some(Event::HealthChecked(Ok(report))) => assert_eq!(report.status, "healthy"),
        _ => bail!("Expected a health event"),
    }

    action_tx.send(Action::Ask(
        Some("abc".to_string()),
        "Who?".to_string(),
        Settings::default(),
    ))?;
    match event_rx.recv().await {
        Some(Event::AnswerReceived(Ok(answer))) => assert_eq!(answer.text, "Billy."),
        _ => bail!("Expected an answer event"),
    }

    drop(action_tx);
    worker.await??;

    health_mock.assert_async().await;
    ask_mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_reports_gateway_failures() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("DELETE", "/clear-database")
        .with_status(401)
        .with_body(json!({"detail": "Not authenticated"}).to_string())
        .create_async()
        .await;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let gateway = gateway(server.url());
    let worker = tokio::spawn(async move {
        return ActionsService::start(gateway, event_tx, &mut action_rx).await;
    });

    action_tx.send(Action::ClearKnowledgeBase(None))?;
    match event_rx.recv().await {
        Some(Event::KnowledgeBaseCleared(Err(err))) => assert_eq!(
            err,
            ClientError::Authentication(Some("Not authenticated".to_string()))
        ),
        _ => bail!("Expected a failed clear event"),
    }

    drop(action_tx);
    worker.await??;
    return Ok(());
}

#[test]
fn it_lists_every_command_in_help() {
    let text = help_text();

    for command in [
        "/upload", "/files", "/remove", "/submit", "/drop", "/settings", "/set", "/clear ",
        "/clearkb", "/health", "/logout", "/quit", "/help",
    ] {
        assert!(text.contains(command), "missing {command}");
    }
}
