//! Agora - interactive front end for the dual-agent arena
//!
//! Terminal client: pick two personalities (or upload a custom one),
//! enter a topic, and watch the conversation arrive turn by turn.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agora::catalog::{AgentSelection, AgentSlot, PersonalityCatalog};
use agora::config::Config;
use agora::display;
use agora::service::{ConversationService, HttpConversationService};
use agora::session::SessionController;
use agora::upload::UploadPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::load(None)?;
    config.validate()?;

    let service: Arc<dyn ConversationService> =
        Arc::new(HttpConversationService::new(&config.service)?);
    let catalog = Arc::new(PersonalityCatalog::new(Arc::clone(&service)));
    let selection = Arc::new(AgentSelection::new());
    let uploads = UploadPipeline::new(
        Arc::clone(&service),
        Arc::clone(&catalog),
        Arc::clone(&selection),
        config.upload.status_display(),
    );
    let controller = SessionController::new(Arc::clone(&service), config.session.turn_delay());

    display::print_welcome();

    catalog.load().await;
    if catalog.is_empty() {
        display::print_error("No personalities available. Is the arena service running?");
        return Ok(());
    }
    selection.apply_defaults(&catalog);

    let mut editor = DefaultEditor::new()?;

    loop {
        display::print_personalities(&catalog.personalities());

        let Some(agent_a) = choose_agent(&mut editor, &catalog, &uploads, AgentSlot::A).await?
        else {
            break;
        };
        selection.select(AgentSlot::A, agent_a.clone());
        println!("Agent A: {}", agent_a);

        let Some(agent_b) = choose_agent(&mut editor, &catalog, &uploads, AgentSlot::B).await?
        else {
            break;
        };
        selection.select(AgentSlot::B, agent_b.clone());
        println!("Agent B: {}", agent_b);

        let topic = match read_line(&mut editor, "Topic of discussion: ")? {
            Some(topic) => topic,
            None => break,
        };

        match controller.start(&agent_a, &agent_b, &topic).await {
            Ok(_) => {}
            Err(e) => {
                display::print_error(&e.to_string());
                continue;
            }
        }

        watch_transcript(&controller, &agent_a).await;

        match read_line(&mut editor, "Enter for a new debate, q to quit: ")? {
            Some(answer) if answer.eq_ignore_ascii_case("q") => break,
            Some(_) => controller.reset(),
            None => break,
        }
    }

    controller.reset();
    println!("Goodbye.");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Prompt until a personality is chosen for the slot
///
/// Accepts a catalog number or `u <path>` to upload a document as a
/// custom persona; the upload pipeline auto-selects the result. Returns
/// `None` when the user quits.
async fn choose_agent(
    editor: &mut DefaultEditor,
    catalog: &PersonalityCatalog,
    uploads: &UploadPipeline,
    slot: AgentSlot,
) -> Result<Option<String>> {
    let prompt = format!(
        "Select Agent {} (1-{}, \"u <path>\" to upload, q to quit): ",
        slot,
        catalog.len()
    );

    loop {
        let input = match read_line(editor, &prompt)? {
            Some(input) => input,
            None => return Ok(None),
        };

        if input.eq_ignore_ascii_case("q") {
            return Ok(None);
        }

        if let Some(path) = input.strip_prefix("u ") {
            match upload_from_path(uploads, path.trim(), slot).await {
                Ok(name) => {
                    if let Some(status) = uploads.status() {
                        display::print_status(&status);
                    }
                    return Ok(Some(name));
                }
                Err(e) => {
                    display::print_error(&e.to_string());
                    continue;
                }
            }
        }

        let personalities = catalog.personalities();
        match input.parse::<usize>() {
            Ok(n) if n >= 1 && n <= personalities.len() => {
                return Ok(Some(personalities[n - 1].name.clone()));
            }
            _ => display::print_error("Invalid selection. Please try again."),
        }
    }
}

async fn upload_from_path(uploads: &UploadPipeline, path: &str, slot: AgentSlot) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let filename = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    display::print_status("Analyzing profile...");
    uploads.upload(&filename, bytes, slot).await
}

/// Print turns as they arrive until the conversation ends
///
/// Ctrl-C stops the session locally; the poller notices the identity
/// mismatch on its next guard check and winds down on its own.
async fn watch_transcript(controller: &SessionController, agent_a: &str) {
    let mut printed = 0;
    loop {
        let transcript = controller.transcript();
        for turn in &transcript[printed..] {
            display::print_turn(turn, turn.speaker == agent_a);
        }
        printed = transcript.len();

        if !controller.is_active() {
            display::print_status("Conversation ended.");
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(200)) => {}
            _ = tokio::signal::ctrl_c() => {
                controller.stop();
                println!();
                display::print_status("Conversation stopped.");
                return;
            }
        }
    }
}

fn read_line(editor: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match editor.readline(prompt) {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
