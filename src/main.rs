#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use anyhow::Result;
use domain::models::Action;
use domain::models::Event;
use infrastructure::backends::BackendManager;
use tokio::sync::mpsc;
use tokio::task;
use yansi::Paint;

use crate::application::cli;
use crate::application::cli::Request;
use crate::application::ui;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::AppState;
use crate::domain::services::SessionStore;
use crate::domain::services::SettingsStore;
use crate::domain::services::TokenStorage;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! BillyBot has failed with the following app version and error.\n\nVersion: {}\nBuilt: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_BUILD_DATE"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn run(request: Request) -> Result<bool> {
    let gateway = BackendManager::get()?;

    let mut session = SessionStore::new(TokenStorage::default());
    if let Err(err) = session.restore().await {
        tracing::warn!(error = ?err, "Ignoring unreadable credentials file");
    }
    let mut app_state = AppState::new(session, SettingsStore::from_config()?);

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut background_futures = task::JoinSet::new();
    let worker_gateway = gateway.clone();
    background_futures.spawn(async move {
        return ActionsService::start(worker_gateway, event_tx, &mut action_rx).await;
    });

    let res = ui::start(&mut app_state, request, gateway, action_tx, event_rx).await;
    background_futures.shutdown().await;

    return res;
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let file_appender = tracing_appender::rolling::never(cli::log_dir(), "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("billybot")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let request = match cli::parse().await {
        Ok(Some(request)) => request,
        Ok(None) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    match run(request).await {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(err) => handle_error(err),
    }
}
