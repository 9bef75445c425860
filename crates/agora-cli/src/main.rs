//! Agora CLI
//!
//! Terminal client for the public chat room, built on the same identity gate,
//! composer and room controller as the desktop app.
//!
//! ## Usage
//!
//! ```bash
//! # Pick a display name (stored in the data directory)
//! agora identity set "Ada"
//!
//! # Show the room
//! agora history --limit 20
//!
//! # Post a message, optionally with a file
//! agora send "hello room"
//! agora send "minutes attached" --file notes.pdf
//!
//! # Follow the room live until Ctrl+C
//! agora watch
//!
//! # Remove one of your own messages
//! agora delete <id>
//!
//! # Save a message's attachment
//! agora download <id> --out ~/Downloads
//!
//! # Talk to a hosted project instead of the local database
//! SUPABASE_URL=https://xyz.supabase.co SUPABASE_ANON_KEY=... agora history
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use agora_core::logging::{read_entries, LoggingBuilder};
use agora_core::message::MAX_BODY_CHARS;
use agora_core::notice::{self, Notice};
use agora_core::{
    format_bytes, ChatBackend, ChatConfig, Composer, FeedStatus, GateState, IdentityGate,
    MessageStore, MessageView, PendingFile, RoomController, RoomEvent, Session, Storage,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

/// Agora - public chat room
#[derive(Parser)]
#[command(name = "agora")]
#[command(version = "0.1.0")]
#[command(about = "Agora - public chat room")]
#[command(
    long_about = "A single public chat room with realtime updates and file sharing. Uses a local database unless a hosted project URL is given."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Data directory (default: ~/.agora/data)
    #[arg(short, long, global = true, env = "AGORA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Hosted project URL (uses the local database when unset)
    #[arg(long, global = true, env = "SUPABASE_URL")]
    url: Option<String>,

    /// Anonymous API key for the hosted project
    #[arg(long, global = true, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    anon_key: Option<String>,

    /// Storage bucket for attachments
    #[arg(long, global = true, env = "AGORA_BUCKET")]
    bucket: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show backend and identity information
    Info,

    /// Display name management
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },

    /// Print the message history
    History {
        /// Only show the newest N messages
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Post a message
    Send {
        /// Message text (may be empty when a file is attached)
        #[arg(default_value = "")]
        text: String,
        /// Attach a file (max 10 MB; images, PDF, Word, plain text)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Post as "Guest" without a stored name
        #[arg(long)]
        guest: bool,
    },

    /// Delete one of your own messages
    Delete {
        /// Message ID
        id: String,
    },

    /// Print history, then live changes until Ctrl+C
    Watch,

    /// Save a message's attachment
    Download {
        /// Message ID
        id: String,
        /// Target directory (default: current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show diagnostic log entries
    Logs {
        /// Only the last N entries
        #[arg(short, long, default_value = "50")]
        tail: usize,
        /// Minimum level: trace, debug, info, warn, error
        #[arg(short, long, default_value = "info")]
        level: String,
    },
}

#[derive(Subcommand)]
enum IdentityAction {
    /// Show the stored display name
    Show,
    /// Store a display name (1-30 characters)
    Set {
        /// Display name
        name: String,
    },
    /// Forget the stored display name
    Clear,
}

fn setup_logging(config: &ChatConfig, verbosity: u8) -> Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let path = LoggingBuilder::new(config.logs_dir(), "cli")
        .with_filter(filter)
        .init()?;
    debug!(path = %path.display(), "Writing diagnostic log");
    Ok(())
}

/// Get the default data directory (~/.agora/data)
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".agora")
        .join("data")
}

/// Session from the stored name, or a guest session when allowed
fn require_session(storage: &Storage, allow_guest: bool) -> Result<Session> {
    let mut gate = IdentityGate::open(storage.clone());
    if let Some(session) = gate.session() {
        return Ok(session.clone());
    }
    if allow_guest {
        return Ok(gate.continue_as_guest());
    }
    anyhow::bail!("No display name set. Run `agora identity set <name>` or pass --guest")
}

/// Room with history loaded; load failures become errors
async fn open_room(backend: Arc<dyn ChatBackend>, session: Session) -> Result<RoomController> {
    let room = RoomController::new(backend, session);
    if let Some(notice) = room.load_history().await {
        anyhow::bail!("{}", notice);
    }
    Ok(room)
}

fn print_message(view: &MessageView) {
    let author = view.author_label.as_deref().unwrap_or("you");
    println!("[{}] {}", view.time_label, author);
    if !view.body.is_empty() {
        for line in view.body.lines() {
            println!("  {}", line);
        }
    }
    if let Some(attachment) = &view.attachment {
        println!("  file: {} ({})", attachment.name, attachment.size_label);
    }
    println!("  ID: {}", view.id);
}

/// Keep only the final path component of an attachment name
fn safe_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("attachment")
        .to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let config = ChatConfig::resolve(&data_dir, cli.url, cli.anon_key, cli.bucket, false)?;

    setup_logging(&config, cli.verbose)?;

    let storage = config.open_storage()?;
    let backend = config.connect(&storage)?;

    match cli.command {
        Commands::Info => {
            let gate = IdentityGate::open(storage.clone());
            let history = backend.fetch_all().await;

            println!("Agora v0.1.0");
            println!();
            println!("Identity:");
            match gate.session() {
                Some(session) => println!("  Display name: {}", session.author_name()),
                None => println!("  Display name: (not set)"),
            }
            println!();
            println!("Room:");
            println!("  Backend: {}", backend.kind());
            println!("  Bucket: {}", config.bucket);
            match history {
                Ok(messages) => println!("  Messages: {}", messages.len()),
                Err(e) => println!("  Messages: (unavailable: {})", e),
            }
            println!();
            println!("Data directory: {}", config.data_dir().display());
        }

        Commands::Identity { action } => {
            let mut gate = IdentityGate::open(storage.clone());
            match action {
                IdentityAction::Show => match gate.state() {
                    GateState::Entered(session) => {
                        println!("Display name: {}", session.author_name());
                    }
                    GateState::Prompt => println!("No display name set."),
                },

                IdentityAction::Set { name } => {
                    let session = gate
                        .submit(&name)
                        .map_err(|e| anyhow::anyhow!("Invalid display name: {}", e))?;
                    println!("Display name set to {}", session.author_name());
                }

                IdentityAction::Clear => {
                    gate.reset()?;
                    println!("Display name cleared.");
                }
            }
        }

        Commands::History { limit } => {
            let session = require_session(&storage, true)?;
            let room = open_room(backend, session).await?;
            let views = room.views(false);

            if views.is_empty() {
                println!("No messages yet.");
            } else {
                let skip = limit.map_or(0, |n| views.len().saturating_sub(n));
                for view in &views[skip..] {
                    print_message(view);
                }
            }
        }

        Commands::Send { text, file, guest } => {
            let text = text.trim();
            if text.chars().count() > MAX_BODY_CHARS {
                anyhow::bail!("Message is too long (max {} characters)", MAX_BODY_CHARS);
            }
            let session = require_session(&storage, guest)?;

            let mut composer = Composer::new();
            composer.set_draft(text);
            if let Some(path) = file {
                let pending = PendingFile::from_path(&path).await?;
                composer
                    .select_file(pending)
                    .map_err(|notice| anyhow::anyhow!("{}", notice))?;
            }

            let submission = match composer.begin_submit(&session) {
                Some(Ok(submission)) => submission,
                Some(Err(notice)) => anyhow::bail!("{}", notice),
                None => anyhow::bail!("Nothing to send: give a message or --file"),
            };

            let room = RoomController::new(backend, session);
            let outcome = room.send(submission).await;
            composer.finish();
            if let Some(notice) = outcome {
                anyhow::bail!("{}", notice);
            }
            println!("Message sent.");
        }

        Commands::Delete { id } => {
            let session = require_session(&storage, false)?;
            let room = open_room(backend, session).await?;
            if let Some(notice) = room.delete(&id).await {
                anyhow::bail!("{}", notice);
            }
            println!("Message deleted.");
        }

        Commands::Watch => {
            let session = require_session(&storage, true)?;
            let room = RoomController::new(backend, session);
            let mut events = room.events();
            for notice in room.mount().await {
                eprintln!("{}", notice);
            }
            if room.feed_status() == FeedStatus::Lost {
                anyhow::bail!("Cannot watch the room without live updates");
            }

            for view in room.views(false) {
                print_message(&view);
            }
            println!();
            println!("Watching the room. Press Ctrl+C to stop.");
            println!();

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        println!();
                        println!("Received shutdown signal...");
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(RoomEvent::Appended { id }) => {
                            if let Some(view) = room.views(false).into_iter().find(|v| v.id == id) {
                                print_message(&view);
                            }
                        }
                        Ok(RoomEvent::Removed { id }) => println!("(deleted {})", id),
                        Ok(RoomEvent::Feed { status: FeedStatus::Lost }) => {
                            room.unmount();
                            anyhow::bail!("{}", Notice::error(notice::LIVE_UPDATES_UNAVAILABLE));
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Watch output fell behind");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }

            room.unmount();
        }

        Commands::Download { id, out } => {
            let session = require_session(&storage, true)?;
            let room = open_room(backend, session).await?;
            let (attachment, data) = room
                .download(&id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to download file: {}", e))?;

            let dir = out.unwrap_or_else(|| PathBuf::from("."));
            tokio::fs::create_dir_all(&dir).await?;
            let target = dir.join(safe_file_name(&attachment.name));
            tokio::fs::write(&target, &data).await?;

            println!(
                "Saved {} ({}) to {}",
                attachment.name,
                format_bytes(data.len() as u64),
                target.display()
            );
        }

        Commands::Logs { tail, level } => {
            let entries: Vec<_> = read_entries(config.logs_dir())?
                .into_iter()
                .filter(|e| e.at_least(&level))
                .collect();

            if entries.is_empty() {
                println!("No log entries.");
            } else {
                let skip = entries.len().saturating_sub(tail);
                for entry in &entries[skip..] {
                    println!("{}", entry.display_line());
                }
            }
        }
    }

    Ok(())
}
