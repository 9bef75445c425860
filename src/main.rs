#![allow(non_snake_case)]

mod app;
mod components;
pub mod context;
mod pages;
mod theme;

use std::path::PathBuf;
use std::sync::OnceLock;

use agora_core::logging::LoggingBuilder;
use agora_core::{BackendConfig, ChatConfig};
use clap::Parser;
use dioxus::desktop::{Config, WindowBuilder};

/// Global chat configuration, set from command line
static CHAT_CONFIG: OnceLock<ChatConfig> = OnceLock::new();

/// Get the chat configuration (set from command line or default)
pub fn chat_config() -> ChatConfig {
    CHAT_CONFIG
        .get()
        .cloned()
        .unwrap_or_else(|| ChatConfig::local(default_data_dir("agora")))
}

fn default_data_dir(dir_name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(dir_name)
}

/// Agora - public chat room
#[derive(Parser, Debug)]
#[command(name = "agora-desktop")]
#[command(about = "Agora - public chat room with realtime updates and file sharing")]
struct Args {
    /// Data directory for storage (use different dirs for multiple instances)
    #[arg(short, long, env = "AGORA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Instance name (creates data dir: agora-<name>)
    #[arg(short, long)]
    name: Option<String>,

    /// Instance number (shorthand for --name with number)
    #[arg(short, long)]
    instance: Option<u8>,

    /// Keep messages, files and the display name in memory only
    #[arg(long)]
    memory: bool,

    /// Hosted project URL (uses the local database when unset)
    #[arg(long, env = "SUPABASE_URL")]
    url: Option<String>,

    /// Anonymous API key for the hosted project
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    anon_key: Option<String>,

    /// Storage bucket for attachments
    #[arg(long, env = "AGORA_BUCKET")]
    bucket: Option<String>,
}

fn main() {
    let args = Args::parse();

    // Determine data directory and display name
    let (data_dir, display_name) = if let Some(dir) = args.data_dir {
        let label = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("custom")
            .to_string();
        (dir, label)
    } else if let Some(ref name) = args.name {
        (default_data_dir(&format!("agora-{}", name)), name.clone())
    } else if let Some(instance) = args.instance {
        let dir = if instance == 1 {
            default_data_dir("agora")
        } else {
            default_data_dir(&format!("agora-{}", instance))
        };
        (dir, format!("Instance {}", instance))
    } else {
        (default_data_dir("agora"), String::new())
    };

    let config = match ChatConfig::resolve(
        &data_dir,
        args.url,
        args.anon_key,
        args.bucket,
        args.memory,
    ) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("agora-desktop: {}", e);
            std::process::exit(2);
        }
    };

    let instance = if display_name.is_empty() {
        "desktop".to_string()
    } else {
        display_name.replace(' ', "-").to_lowercase()
    };
    match LoggingBuilder::new(config.logs_dir(), instance)
        .with_filter("agora=info,agora_core=info,agora_ui=info")
        .init()
    {
        Ok(path) => tracing::debug!("Diagnostic log at {:?}", path),
        Err(e) => eprintln!("agora-desktop: logging disabled: {}", e),
    }

    // Store configuration globally
    let _ = CHAT_CONFIG.set(config.clone());

    // Window title with instance name
    let title = if !display_name.is_empty() {
        format!("Agora - {}", display_name)
    } else {
        "Agora".to_string()
    };

    let backend = match config.backend {
        BackendConfig::Local => "local",
        BackendConfig::Memory => "memory",
        BackendConfig::Supabase { .. } => "hosted",
    };
    tracing::info!(
        "Starting '{}' with data dir: {:?} ({} backend)",
        display_name,
        data_dir,
        backend
    );

    let window = WindowBuilder::new()
        .with_title(&title)
        .with_inner_size(dioxus::desktop::LogicalSize::new(520.0, 820.0))
        .with_resizable(true);

    // File drops are handled by the composer, not the webview
    let config = Config::new()
        .with_window(window)
        .with_disable_drag_drop_handler(false);

    dioxus::LaunchBuilder::desktop()
        .with_cfg(config)
        .launch(app::App);
}
