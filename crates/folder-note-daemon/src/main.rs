//! folder-note: keeps folder notes paired with their folders in a vault on disk.
//!
//! Runs the same relation engine as the editor integration, over the native
//! filesystem, with a file watcher feeding it vault events.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use folder_note_core::{NoVisibility, NoteAction, PlacementPolicy, RelationEvent};
use folder_note_daemon::config::expand_tilde;
use folder_note_daemon::{Daemon, FileWatcher, HiddenListFile, SettingsStore};

#[derive(Parser, Debug)]
#[command(name = "folder-note")]
#[command(about = "Folder note relation daemon")]
struct Args {
    /// Path to the vault directory (supports ~ for home directory)
    #[arg(short, long, env = "FOLDER_NOTE_VAULT")]
    vault: String,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the vault and keep folder notes in sync (default)
    Watch {
        /// Print relation changes to stdout as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Open a folder's note, creating it from the template if missing
    Create { folder: String },
    /// Print the folder a folder note belongs to
    Reveal { note: String },
    /// List a folder's children with its folder note flagged
    List {
        folder: String,
        /// Include the folder's own note in the listing
        #[arg(long)]
        all: bool,
    },
    /// Show or change the vault's settings
    Settings {
        /// Placement policy: index, inside or outside
        #[arg(long)]
        policy: Option<PlacementPolicy>,
        /// Note name used by the index policy
        #[arg(long)]
        index_name: Option<String>,
        /// Hide folder notes in the explorer
        #[arg(long)]
        hide: Option<bool>,
        /// Rename a folder's note when the folder is renamed
        #[arg(long)]
        auto_rename: Option<bool>,
        /// Body of new folder notes ({{FOLDER_NAME}} and {{FOLDER_PATH}} are substituted)
        #[arg(long)]
        template: Option<String>,
    },
}

async fn watch(mut daemon: Daemon, json: bool) -> Result<()> {
    let _subscription = json.then(|| {
        daemon.engine().events().subscribe(|event: RelationEvent| {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Failed to serialize relation event: {}", e),
            }
        })
    });

    // Start watching before the ready pass so nothing in between is missed
    let mut watcher = FileWatcher::new(daemon.vault_path().to_path_buf())?;
    info!("File watcher started");

    daemon.ready().await?;
    info!("Daemon running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            // Handle file watcher events
            Some(event) = watcher.event_rx().recv() => {
                daemon.on_vault_event(event).await;
            }

            // Handle graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down");
    daemon.shutdown();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or debug with --verbose).
    // Logs go to stderr so stdout stays free for command output.
    let default_filter = if args.verbose {
        "debug,folder_note_core=debug,folder_note_daemon=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let vault_path = expand_tilde(&args.vault);
    info!("Vault path: {:?}", vault_path);

    match args.command.unwrap_or(Command::Watch { json: false }) {
        Command::Watch { json } => {
            let visibility = Arc::new(HiddenListFile::new(&vault_path));
            let daemon = Daemon::open(vault_path, visibility).await?;
            watch(daemon, json).await?;
        }
        Command::Create { folder } => {
            // A running watcher picks up the new note and updates the hidden list
            let mut daemon = Daemon::open(vault_path, Arc::new(NoVisibility)).await?;
            match daemon.engine().open_or_create_note(&folder).await? {
                NoteAction::Existing(note) => println!("{}", note),
                NoteAction::Created(note) => {
                    info!("Created {}", note);
                    println!("{}", note);
                }
            }
        }
        Command::Reveal { note } => {
            let mut daemon = Daemon::open(vault_path, Arc::new(NoVisibility)).await?;
            match daemon.engine().reveal_folder(&note).await? {
                Some(folder) => println!("{}", folder),
                None => anyhow::bail!("{} is not a folder note", note),
            }
        }
        Command::List { folder, all } => {
            let mut daemon = Daemon::open(vault_path, Arc::new(NoVisibility)).await?;
            for entry in daemon.engine().list_folder(&folder, all).await? {
                let marker = if entry.is_folder_note { "*" } else { " " };
                let suffix = if entry.is_dir { "/" } else { "" };
                println!("{} {}{}", marker, entry.name, suffix);
            }
        }
        Command::Settings {
            policy,
            index_name,
            hide,
            auto_rename,
            template,
        } => {
            let store = SettingsStore::new(&vault_path);
            let mut settings = store.load().await?;
            let before = settings.clone();

            if let Some(policy) = policy {
                settings.folder_note_pref = policy;
            }
            if let Some(index_name) = index_name {
                settings.index_name = index_name;
            }
            if let Some(hide) = hide {
                settings.hide_note_in_explorer = hide;
            }
            if let Some(auto_rename) = auto_rename {
                settings.auto_rename = auto_rename;
            }
            if let Some(template) = template {
                settings.folder_note_template = template;
            }

            if settings != before {
                store.save(&settings).await?;
                info!("Saved settings to {:?}", store.path());
            }
            info!("Placement: {}", settings.folder_note_pref.description());
            info!(
                "New note modifier: {}",
                settings.modifier_for_new_note.label(cfg!(target_os = "macos"))
            );
            println!("{}", settings.to_json()?);
        }
    }

    Ok(())
}
