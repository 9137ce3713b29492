//! cxload CLI: ingest CX networks and inspect their summaries.
//!
//! Usage:
//!   cxload import <file.cx> [--data-root dir] [--db path] [--limit n]
//!   cxload load <network-id>
//!   cxload show <network-id>

use chrono::Utc;
use clap::{Parser, Subcommand};
use cxload::{LoaderConfig, NetworkLoadingTask, NetworkSummary, OpenStore, SqliteStore, SummaryStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cxload", version, about = "Streaming CX network loader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// YAML loader configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding one subdirectory per network
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Maximum elements per network (negative for unlimited)
    #[arg(long, global = true, allow_hyphen_values = true)]
    limit: Option<i64>,
    /// Log every aspect decision, not just progress
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a CX file into the data root under a new id and load it
    Import {
        /// CX document to ingest
        file: PathBuf,
    },
    /// Load a network already placed at <data-root>/<id>/network.cx
    Load {
        network_id: Uuid,
    },
    /// Print the stored summary of a network
    Show {
        network_id: Uuid,
    },
}

/// Get the default database path (~/.local/share/cxload/cxload.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("cxload").join("cxload.db")
}

fn load_config(cli: &Cli) -> Result<LoaderConfig, String> {
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_yaml_file(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?,
        None => LoaderConfig::default(),
    };
    if let Some(root) = &cli.data_root {
        config = config.with_data_root(root);
    }
    if let Some(limit) = cli.limit {
        config = config.with_element_limit(limit);
    }
    Ok(config)
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<SqliteStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    Ok(Arc::new(store))
}

fn print_summary(summary: &NetworkSummary) {
    println!("Network {}", summary.external_id);
    if let Some(name) = &summary.name {
        println!("  name:        {}", name);
    }
    if let Some(description) = &summary.description {
        println!("  description: {}", description);
    }
    if let Some(version) = &summary.version {
        println!("  version:     {}", version);
    }
    println!("  nodes:       {}", summary.node_count);
    println!("  edges:       {}", summary.edge_count);
    println!("  created:     {}", summary.creation_time.to_rfc3339());
    for property in &summary.properties {
        match &property.subnetwork_id {
            Some(sub) => println!("  property:    {} [{}] = {}", property.predicate_string, sub, property.value),
            None => println!("  property:    {} = {}", property.predicate_string, property.value),
        }
    }
    for warning in &summary.warnings {
        println!("  warning:     {}", warning);
    }
}

fn cmd_import(task: &NetworkLoadingTask, store: &dyn SummaryStore, file: &PathBuf) -> i32 {
    let id = Uuid::new_v4();
    let target = task.config().network_file(&id);
    let copied = target
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|_| std::fs::copy(file, &target));
    if let Err(e) = copied {
        eprintln!("Error: cannot copy '{}': {}", file.display(), e);
        return 1;
    }
    if let Err(e) = store.register_network(&id, Utc::now()) {
        eprintln!("Error: {}", e);
        return 1;
    }
    cmd_load(task, id)
}

fn cmd_load(task: &NetworkLoadingTask, id: Uuid) -> i32 {
    match task.run(id) {
        Ok(summary) => {
            print_summary(&summary);
            0
        }
        Err(e) => {
            eprintln!("Error: network {} failed to load: {}", id, e);
            1
        }
    }
}

fn cmd_show(store: &dyn SummaryStore, id: Uuid) -> i32 {
    let result = store
        .load_summary(&id)
        .and_then(|summary| Ok((summary, store.error_message(&id)?)));
    match result {
        Ok((None, _)) => {
            eprintln!("Error: network {} not found", id);
            1
        }
        Ok((Some(summary), error)) => {
            print_summary(&summary);
            if let Some(message) = error {
                println!("  error:       {}", message);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let store = match open_store(cli.db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let task = NetworkLoadingTask::new(config, store.clone());

    let code = match cli.command {
        Commands::Import { file } => cmd_import(&task, store.as_ref(), &file),
        Commands::Load { network_id } => cmd_load(&task, network_id),
        Commands::Show { network_id } => cmd_show(store.as_ref(), network_id),
    };
    std::process::exit(code);
}
