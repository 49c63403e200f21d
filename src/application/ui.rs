use std::io::Write;
use std::path;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Password;
use tokio::fs;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::io::Lines;
use tokio::io::Stdin;
use tokio::sync::mpsc;
use yansi::Paint;

use super::cli::Request;
use crate::domain::models::Action;
use crate::domain::models::ClientError;
use crate::domain::models::Document;
use crate::domain::models::Event;
use crate::domain::models::GatewayRef;
use crate::domain::models::Outcome;
use crate::domain::models::Role;
use crate::domain::models::SettingUpdate;
use crate::domain::models::SlashCommand;
use crate::domain::models::View;
use crate::domain::services::actions::help_text;
use crate::domain::services::AppState;
use crate::domain::services::CLEAR_CONFIRMATION;

type StdinLines = Lines<BufReader<Stdin>>;

enum Flow {
    Continue,
    Quit,
}

fn print_failure(err: &ClientError, fallback: &str) {
    eprintln!("{}", Paint::red(err.user_message(fallback)));
}

fn print_prompt() -> Result<()> {
    print!("{} ", Paint::cyan(">").bold());
    std::io::stdout().flush()?;
    return Ok(());
}

fn render_outcome(app_state: &AppState) {
    let outcome = match app_state.ingestion.outcome() {
        Some(outcome) => outcome,
        None => return,
    };

    if !outcome.is_success() {
        eprintln!("{}", Paint::red(outcome.message()));
        return;
    }

    println!("{}", Paint::green(outcome.message()));
    if let Outcome::Success {
        storage_location: Some(location),
        ..
    } = outcome
    {
        println!("Stored in {}", Paint::new(location).bold());
    }
}

fn render_last_turn(app_state: &AppState) {
    if let Some(turn) = app_state.query.conversation().last() {
        if turn.is_error {
            eprintln!("{}", Paint::red(&turn.text));
        } else if turn.role == Role::Assistant {
            println!("{} {}", Paint::green("billybot:").bold(), turn.text);
        }
    }
}

fn render_health(app_state: &AppState) {
    match &app_state.last_health {
        Some(Ok(report)) => {
            let message = report.message.as_deref().unwrap_or_default();
            println!("{} {}", Paint::green(&report.status).bold(), message);
        }
        Some(Err(err)) => print_failure(err, "Health check failed"),
        None => (),
    }
}

fn render_settings(app_state: &AppState) {
    let settings = app_state.settings.get();
    println!(
        "persist-dir = {}\nembedding-model = {}\nllm-model = {}\ntop-k = {}\nchunk-size = {}\nchunk-overlap = {}",
        settings.persist_dir,
        settings.embedding_model,
        settings.llm_model,
        settings.top_k,
        settings.chunk_size,
        settings.chunk_overlap
    );
}

fn render_files(app_state: &AppState) {
    let batch = app_state.ingestion.batch();
    if batch.is_empty() {
        println!("No files selected. Use /upload PATH to add some.");
        return;
    }

    for (idx, document) in batch.documents().iter().enumerate() {
        println!("- ({}) {} {}", idx + 1, document.name, Paint::new(document.size_display()).dimmed());
    }
    println!("{} file(s) selected, {}", batch.len(), batch.size_display());
}

/// Applies a backend result to the state and prints what changed.
async fn apply_event(app_state: &mut AppState, event: Event) {
    let render: fn(&AppState) = match &event {
        Event::IngestFinished(_) | Event::KnowledgeBaseCleared(_) => render_outcome,
        Event::AnswerReceived(_) => render_last_turn,
        Event::HealthChecked(_) => render_health,
    };

    let logged_out = app_state.handle_event(event).await;
    render(app_state);

    if logged_out {
        eprintln!(
            "{}",
            Paint::yellow("You've been logged out. Run `billybot login` to continue.")
        );
    }
}

async fn wait_for_event(
    app_state: &mut AppState,
    rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    match rx.recv().await {
        Some(event) => apply_event(app_state, event).await,
        None => bail!("The background worker stopped before replying"),
    }

    return Ok(());
}

async fn read_documents(paths: &[path::PathBuf]) -> Result<Vec<Document>> {
    let mut documents = vec![];
    for file_path in paths {
        let bytes = fs::read(file_path)
            .await
            .with_context(|| return format!("Unable to read {}", file_path.display()))?;
        let name = file_path
            .file_name()
            .map(|e| return e.to_string_lossy().to_string())
            .unwrap_or_else(|| return file_path.to_string_lossy().to_string());

        documents.push(Document::from_file_name(&name, bytes));
    }

    return Ok(documents);
}

fn select_documents(app_state: &mut AppState, documents: Vec<Document>) -> bool {
    let offered = documents.len();
    match app_state.select_documents(documents) {
        Ok(accepted) => {
            if accepted < offered {
                println!(
                    "{}",
                    Paint::yellow(format!("Skipped {} file(s) that aren't PDFs", offered - accepted))
                );
            }
            println!("{accepted} file(s) added, {} selected", app_state.ingestion.batch().len());
            return true;
        }
        Err(err) => {
            print_failure(&err, "Unable to select files");
            return false;
        }
    }
}

async fn login(app_state: &mut AppState, gateway: &GatewayRef, email: Option<String>) -> Result<bool> {
    let email = match email {
        Some(email) => email,
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Email")
            .interact_text()?,
    };
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .interact()?;

    match app_state.session.login(gateway.as_ref(), &email, &password).await {
        Ok(session) => {
            println!("Logged in as {}", Paint::green(&session.display_name).bold());
        }
        Err(err) => {
            print_failure(&err, "Login failed");
            return Ok(false);
        }
    }

    app_state.navigate(View::Chat);
    return Ok(true);
}

async fn register(
    app_state: &AppState,
    gateway: &GatewayRef,
    email: Option<String>,
    username: Option<String>,
) -> Result<bool> {
    let email = match email {
        Some(email) => email,
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Email")
            .interact_text()?,
    };
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords don't match")
        .interact()?;

    match app_state
        .session
        .register(gateway.as_ref(), &email, &password, username.as_deref())
        .await
    {
        Ok(registration) => {
            println!("{}", Paint::green(registration.confirmation));
            println!("You can now log in with `billybot login`.");
            return Ok(true);
        }
        Err(err) => {
            print_failure(&err, "Registration failed");
            return Ok(false);
        }
    }
}

/// Makes sure a stored token is still accepted. Backend outages keep the
/// session, only a rejection ends it.
async fn verify(app_state: &mut AppState, gateway: &GatewayRef) -> bool {
    match app_state.session.session() {
        Some(session) if session.is_verified() => return true,
        Some(session) if session.is_authenticated() => (),
        _ => return false,
    }

    match app_state.session.verify(gateway.as_ref()).await {
        Ok(_) => return true,
        Err(err) if err.is_authentication() => {
            app_state.navigate(View::Login);
            print_failure(&err, "Your session is no longer valid");
            return false;
        }
        Err(err) => {
            tracing::warn!(error = ?err, "Unable to verify stored session");
            print_failure(&err, "Unable to verify your session");
            return true;
        }
    }
}

async fn handle_slash_command(
    app_state: &mut AppState,
    command: SlashCommand,
    tx: &mpsc::UnboundedSender<Action>,
    lines: &mut StdinLines,
) -> Result<Flow> {
    if command.is_quit() {
        return Ok(Flow::Quit);
    }
    if command.is_help() {
        println!("{}", help_text());
        return Ok(Flow::Continue);
    }
    if command.is_health() {
        if let Err(err) = app_state.check_health(tx) {
            print_failure(&err, "Health check failed");
        }
        return Ok(Flow::Continue);
    }
    if command.is_logout() {
        app_state.session.logout().await;
        app_state.navigate(View::Login);
        return Ok(Flow::Continue);
    }
    if command.is_clear_chat() {
        app_state.clear_conversation();
        println!("Conversation cleared.");
        return Ok(Flow::Continue);
    }

    if command.is_settings() || command.is_set() {
        if app_state.navigate(View::Settings) != View::Settings {
            return Ok(Flow::Continue);
        }
        if command.is_settings() {
            render_settings(app_state);
            return Ok(Flow::Continue);
        }

        if command.args.len() < 2 {
            eprintln!("{}", Paint::red("Usage: /set KEY VALUE"));
            return Ok(Flow::Continue);
        }
        let res = SettingUpdate::parse(&command.args[0], &command.args[1..].join(" "))
            .and_then(|update| return app_state.update_setting(update));
        match res {
            Ok(_) => render_settings(app_state),
            Err(err) => print_failure(&err, "Unable to change setting"),
        }
        return Ok(Flow::Continue);
    }

    if app_state.navigate(View::Upload) != View::Upload {
        return Ok(Flow::Continue);
    }

    if command.is_upload() {
        if command.args.is_empty() {
            eprintln!("{}", Paint::red("Usage: /upload PATH..."));
            return Ok(Flow::Continue);
        }
        let paths = command
            .args
            .iter()
            .map(path::PathBuf::from)
            .collect::<Vec<path::PathBuf>>();
        match read_documents(&paths).await {
            Ok(documents) => {
                select_documents(app_state, documents);
            }
            Err(err) => eprintln!("{}", Paint::red(err)),
        }
    } else if command.is_files() {
        render_files(app_state);
    } else if command.is_remove() {
        match command.position_arg() {
            Some(idx) => match app_state.remove_document(idx) {
                Ok(Some(document)) => println!("Removed {}", document.name),
                Ok(None) => println!("There's no file number {}", idx + 1),
                Err(err) => print_failure(&err, "Unable to remove file"),
            },
            None => eprintln!("{}", Paint::red("Usage: /remove FILE_NUMBER")),
        }
    } else if command.is_drop() {
        match app_state.ingestion.clear_selection() {
            Ok(_) => println!("Selection emptied."),
            Err(err) => print_failure(&err, "Unable to empty selection"),
        }
    } else if command.is_submit() {
        match app_state.submit_documents(tx) {
            Ok(_) => println!("Uploading {} file(s)...", app_state.ingestion.batch().len()),
            Err(err) => print_failure(&err, "Upload failed"),
        }
    } else if command.is_clear_knowledge_base() {
        println!(
            "{}",
            Paint::yellow(format!(
                "This deletes everything in the knowledge base. Type {CLEAR_CONFIRMATION} to confirm:"
            ))
        );
        let confirmation = lines.next_line().await?.unwrap_or_default();
        match app_state.clear_knowledge_base(&confirmation, tx) {
            Ok(_) => println!("Clearing the knowledge base..."),
            Err(err) => print_failure(&err, "Failed to clear knowledge base"),
        }
    }

    return Ok(Flow::Continue);
}

async fn handle_line(
    app_state: &mut AppState,
    line: &str,
    tx: &mpsc::UnboundedSender<Action>,
    lines: &mut StdinLines,
) -> Result<Flow> {
    if line.trim().is_empty() {
        return Ok(Flow::Continue);
    }

    if let Some(command) = SlashCommand::parse(line) {
        return handle_slash_command(app_state, command, tx, lines).await;
    }

    if app_state.navigate(View::Chat) != View::Chat {
        return Ok(Flow::Continue);
    }
    if let Err(err) = app_state.ask(line, tx) {
        print_failure(&err, "Failed to get response");
    }

    return Ok(Flow::Continue);
}

async fn chat(
    app_state: &mut AppState,
    gateway: &GatewayRef,
    tx: &mpsc::UnboundedSender<Action>,
    rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<bool> {
    if !verify(app_state, gateway).await && !login(app_state, gateway, None).await? {
        return Ok(false);
    }

    println!(
        "{}",
        Paint::new("Ask anything about your documents. Type /help for commands.").dimmed()
    );
    if let Err(err) = app_state.check_health(tx) {
        print_failure(&err, "Health check failed");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_prompt()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => return Ok(true),
                };

                if let Flow::Quit = handle_line(app_state, &line, tx, &mut lines).await? {
                    return Ok(true);
                }
            }
            event = rx.recv() => {
                match event {
                    Some(event) => apply_event(app_state, event).await,
                    None => bail!("The background worker stopped"),
                }
            }
        }

        if app_state.view() == View::Login {
            println!("Logged out. Run `billybot login` or `billybot chat` to continue.");
            return Ok(true);
        }
        print_prompt()?;
    }
}

/// Runs a request to completion. Returns false when the request failed in a
/// way the user should see reflected in the exit code.
pub async fn start(
    app_state: &mut AppState,
    request: Request,
    gateway: GatewayRef,
    tx: mpsc::UnboundedSender<Action>,
    mut rx: mpsc::UnboundedReceiver<Event>,
) -> Result<bool> {
    match request {
        Request::Chat => return chat(app_state, &gateway, &tx, &mut rx).await,
        Request::Login { email } => return login(app_state, &gateway, email).await,
        Request::Logout => {
            app_state.session.logout().await;
            println!("Logged out.");
        }
        Request::Register { email, username } => {
            return register(app_state, &gateway, email, username).await;
        }
        Request::WhoAmI => {
            if !verify(app_state, &gateway).await {
                eprintln!("{}", Paint::red("Not logged in. Run `billybot login`."));
                return Ok(false);
            }
            if let Some(session) = app_state.session.session() {
                println!("{} ({})", Paint::new(&session.display_name).bold(), session.subject);
            }
        }
        Request::Health => {
            app_state.check_health(&tx)?;
            wait_for_event(app_state, &mut rx).await?;
            return Ok(matches!(app_state.last_health, Some(Ok(_))));
        }
        Request::Upload { files } => {
            let documents = read_documents(&files).await?;
            if !select_documents(app_state, documents) {
                return Ok(false);
            }
            if let Err(err) = app_state.submit_documents(&tx) {
                print_failure(&err, "Upload failed");
                return Ok(false);
            }

            println!("Uploading {} file(s)...", app_state.ingestion.batch().len());
            wait_for_event(app_state, &mut rx).await?;
            return Ok(app_state
                .ingestion
                .outcome()
                .map(|e| return e.is_success())
                .unwrap_or(false));
        }
        Request::Ask { question } => {
            if let Err(err) = app_state.ask(&question, &tx) {
                print_failure(&err, "Failed to get response");
                return Ok(false);
            }

            wait_for_event(app_state, &mut rx).await?;
            return Ok(app_state
                .query
                .conversation()
                .last()
                .map(|e| return !e.is_error)
                .unwrap_or(false));
        }
        Request::Clear { confirmation } => {
            let confirmation = match confirmation {
                Some(confirmation) => confirmation,
                None => Input::<String>::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!(
                        "This deletes everything in the knowledge base. Type {CLEAR_CONFIRMATION} to confirm"
                    ))
                    .allow_empty(true)
                    .interact_text()?,
            };
            if let Err(err) = app_state.clear_knowledge_base(&confirmation, &tx) {
                print_failure(&err, "Failed to clear knowledge base");
                return Ok(false);
            }

            wait_for_event(app_state, &mut rx).await?;
            return Ok(app_state
                .ingestion
                .outcome()
                .map(|e| return e.is_success())
                .unwrap_or(false));
        }
    }

    return Ok(true);
}
