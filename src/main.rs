//! Multi-Storage CLI
//!
//! Inspects and manipulates a primary storage and its failovers through the
//! policy-driven multi-storage folder.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌────────────────────────────┐
//! │  YAML config │ ──► │   MultiStorage   │ ──► │  default, failover_1, ...  │
//! └──────────────┘     └────────┬─────────┘     └────────────────────────────┘
//!                               │
//!                      ┌────────┴─────────┐
//!                      │ status cache file│  (~/.multistorage_status_cache_*)
//!                      └──────────────────┘
//! ```

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use multi_storage::{
    list_folder_recursively_with_prefix, AppConfig, Folder, MultiFolder, MultiStorage, Policies,
    SharedMemories, Storage,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Multi-Storage - policy-driven object storage failover
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "MULTISTORAGE_CONFIG", default_value = "multistorage.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print aliveness of every configured storage
    Alive,

    /// List a folder
    Ls {
        /// Folder path
        #[arg(default_value = "")]
        path: String,

        /// List every alive storage, not only the first one
        #[arg(long)]
        all: bool,

        /// List objects below the path recursively
        #[arg(long, short)]
        recursive: bool,
    },

    /// Print an object to stdout
    Cat {
        path: String,
    },

    /// Upload a local file
    Put {
        path: String,
        file: PathBuf,
    },

    /// Delete objects
    Rm {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Refresh storage statuses and write them to the cache file
    Flush,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting Multi-Storage CLI");
    info!("  Version: {}", multi_storage::VERSION);
    info!("  Config: {}", args.config.display());

    let config = AppConfig::from_file(&args.config)
        .await
        .with_context(|| format!("load config {}", args.config.display()))?;
    let memories = SharedMemories::new();
    let storage = config.open(&memories).await.context("open storages")?;

    let result = run(&storage, args.command).await;
    let closed = storage.close().await.context("close storages");
    result?;
    closed
}

async fn run(storage: &MultiStorage, command: Command) -> anyhow::Result<()> {
    let root = storage.root_multi_folder();

    match command {
        Command::Alive => {
            for name in storage.storages().names() {
                let alive = storage.collector().specific_storage(&name).await?;
                println!("{name}\t{}", if alive { "alive" } else { "dead" });
            }
        }

        Command::Ls {
            path,
            all,
            recursive,
        } => {
            let folder = if all {
                root.use_all_alive_storages()
                    .await?
                    .with_policies(Policies::UNITE_ALL_STORAGES)
            } else {
                root.use_first_alive_storage().await?
            };

            if recursive {
                for object in list_folder_recursively_with_prefix(&folder, &path).await? {
                    print_object(&object);
                }
                return Ok(());
            }

            let folder = folder.multi_sub_folder(&path);
            let (objects, sub_folders) = folder.list_multi_folder().await?;
            for sub in sub_folders {
                println!("{}", sub.path());
            }
            for object in objects {
                print_object(&object);
            }
        }

        Command::Cat { path } => {
            let folder = use_alive(&root).await?;
            let (mut reader, from) = folder.read_object_with_storage(&path).await?;
            info!(storage = %from, path = %path, "Reading object");
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut reader, &mut stdout).await?;
            stdout.flush().await?;
        }

        Command::Put { path, file } => {
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("read {}", file.display()))?;
            let folder = use_alive(&root).await?;
            folder.put_object(&path, Bytes::from(content)).await?;
            println!("{path}");
        }

        Command::Rm { paths } => {
            let folder = use_alive(&root).await?;
            folder.delete_objects(&paths).await?;
        }

        Command::Flush => {
            let alive = storage.refresh_statuses().await?;
            println!("alive: {}", alive.join(", "));
        }
    }
    Ok(())
}

/// Folder over every alive storage with the configured policies
async fn use_alive(root: &MultiFolder) -> anyhow::Result<MultiFolder> {
    Ok(root.use_all_alive_storages().await?)
}

fn print_object(object: &multi_storage::Object) {
    println!(
        "{}\t{}\t{}\t{}",
        object.storage_name(),
        object.size,
        object.last_modified.to_rfc3339(),
        object.name
    );
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
