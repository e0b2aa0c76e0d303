//! Parley terminal client - composition root.
//!
//! Ties the crates together into a single executable:
//! 1. Load configuration from TOML
//! 2. Resolve the persisted session identity
//! 3. Build the HTTP backend client and the session engine
//! 4. Run the interactive loop (typed input, voice capture, resume upload)
//!
//! The loop is deliberately thin: all invariants live in the session
//! engine, which any other front end could drive the same way.

mod cli;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use parley_client::ApiClient;
use parley_core::config::ParleyConfig;
use parley_session::{ChatSession, FileIdentityStore, SessionIdentity};
use parley_voice::{CaptureOutcome, SpeechCapability, VoiceCapture};

use cli::CliArgs;

/// Expand ~ to the home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

fn print_progress(session: &ChatSession) {
    let stats = session.slot_stats();
    if stats.total > 0 {
        println!(
            "  [interview: {}/{} slots filled, {} remaining]",
            stats.filled, stats.total, stats.remaining
        );
    }
    if let Some(state) = session.interview_state() {
        if state.ended {
            println!("  [interview ended]");
        }
    }
    for call in session.tool_calls() {
        match call.target {
            Some(target) => println!("  [tool: {} -> {}]", call.tool, target),
            None => println!("  [tool: {}]", call.tool),
        }
    }
}

fn print_last_answer(session: &ChatSession) {
    if let Some(message) = session.messages().last() {
        println!("assistant> {}", message.content);
    }
}

async fn handle_upload(session: &ChatSession, path: &str) {
    let path = Path::new(path.trim());
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("could not read {}: {e}", path.display());
            return;
        }
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "resume".to_string());

    match session.upload(&file_name, bytes).await {
        Ok(true) => println!("resume indexed - you can start chatting"),
        Ok(false) => println!("upload settled but the backend did not confirm indexing"),
        Err(e) => println!("upload failed: {e}"),
    }
}

async fn handle_voice(session: &ChatSession) {
    match session.capture().await {
        Ok(CaptureOutcome::Transcript(_)) => {
            println!("composer> {}", session.composer());
        }
        Ok(CaptureOutcome::Unsupported) => {
            println!("voice capture is not supported in this environment - type instead");
        }
        Ok(CaptureOutcome::Error(reason)) => {
            println!("voice capture failed: {reason}");
        }
        Err(e) => println!("{e}"),
    }
}

async fn handle_send(session: &ChatSession, text: &str) {
    if !session.has_document() {
        println!("upload a resume first: /upload <path>");
        return;
    }
    session.set_composer(text);
    match session.send(text).await {
        Ok(()) => {
            print_last_answer(session);
            print_progress(session);
        }
        Err(e) => {
            println!("send failed: {e}");
            println!("composer restored: {}", session.composer());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ParleyConfig::load_or_default(&config_file);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Session identity, persisted under the data directory.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    let identity_store = FileIdentityStore::new(&data_dir);
    let user_id = SessionIdentity::get_or_create(&identity_store);
    tracing::info!(user_id = %user_id, "Session identity resolved");

    // Backend client and session engine. No platform speech recognizer is
    // wired here yet, so the capability is explicitly unavailable and the
    // /voice command reports that instead of failing.
    let base_url = args.resolve_base_url(&config.api.base_url);
    let backend = Arc::new(ApiClient::new(base_url.clone(), config.api.timeout_secs)?);
    let voice = VoiceCapture::new(SpeechCapability::Unavailable);
    let session = Arc::new(
        ChatSession::new(backend, voice, user_id).with_temperature(config.api.temperature),
    );
    tracing::info!(base_url = %base_url, "Session ready");

    // Event log at debug level, for any observer-side tooling.
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(event = event.event_name(), "session event");
        }
    });

    println!("parley - interview assistant client");
    println!("upload a resume to begin: /upload <path>");
    println!("commands: /upload <path>, /voice, /reset, /temperature <t>, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        if line.is_empty() {
            continue;
        } else if line == "/quit" {
            break;
        } else if line == "/reset" {
            session.reset();
            println!("conversation cleared");
        } else if line == "/voice" {
            handle_voice(&session).await;
        } else if let Some(path) = line.strip_prefix("/upload ") {
            handle_upload(&session, path).await;
        } else if let Some(value) = line.strip_prefix("/temperature ") {
            match value.trim().parse::<f64>() {
                Ok(t) => {
                    session.set_temperature(t);
                    println!("temperature set to {t}");
                }
                Err(_) => println!("not a number: {value}"),
            }
        } else if line.starts_with('/') {
            println!("unknown command: {line}");
        } else {
            handle_send(&session, &line).await;
        }
    }

    tracing::info!("Session closed");
    Ok(())
}
