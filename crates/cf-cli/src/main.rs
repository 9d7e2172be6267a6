//! Curtain Fall CLI
//!
//! Compiles filter lists and manages blocking-list subscriptions.

mod error;
mod fetch;
mod manager;
mod registry;
mod store;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use cf_compiler::{compile_filter_list, generate_network_rules, RuleIdAllocator};

use crate::error::ListError;
use crate::fetch::{is_remote, HttpFetcher, ListFetcher};
use crate::manager::BlockingListManager;
use crate::registry::JsonFileRegistry;
use crate::store::JsonFileStore;

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(about = "Curtain Fall filter list compiler and blocking-list manager")]
struct Cli {
    /// Blocking-list store file
    #[arg(long, global = true, default_value = "blocking-lists.json")]
    store: PathBuf,

    /// Network rule registry file
    #[arg(long, global = true, default_value = "network-rules.json")]
    registry: PathBuf,

    /// Fetch timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a filter list file or URL into rules
    Compile {
        /// Input filter list (path or http(s) URL)
        #[arg(short, long)]
        input: String,

        /// Output file for the resolved rules (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for the network rule descriptions (JSON)
        #[arg(long)]
        network_output: Option<PathBuf>,
    },

    /// Manage subscribed blocking lists
    #[command(subcommand)]
    Lists(ListCommands),
}

#[derive(Subcommand)]
enum ListCommands {
    /// Subscribe to a list
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
    },

    /// Re-fetch every enabled list once
    Refresh,

    /// Re-fetch enabled lists periodically
    Watch {
        /// Refresh period in seconds
        #[arg(long, default_value_t = 86_400)]
        interval: u64,
    },

    /// Enable or disable a list
    Toggle {
        id: String,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },

    /// Remove a list
    Delete { id: String },

    /// Show subscribed lists
    Show {
        /// Print the rules of enabled lists as JSON
        #[arg(long)]
        rules: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compile {
            ref input,
            ref output,
            ref network_output,
        } => cmd_compile(&cli, input, output.as_deref(), network_output.as_deref()).await,
        Commands::Lists(ref command) => cmd_lists(&cli, command).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_target(false)
        .compact()
        .try_init();
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ListError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ListError::json(path, e))?;
    fs::write(path, text).map_err(|e| ListError::io(path, e))
}

async fn cmd_compile(
    cli: &Cli,
    input: &str,
    output: Option<&Path>,
    network_output: Option<&Path>,
) -> Result<(), ListError> {
    let start = Instant::now();

    let text = if is_remote(input) {
        let fetcher = HttpFetcher::new(Duration::from_secs(cli.timeout))?;
        fetcher.fetch(input).await?
    } else {
        fs::read_to_string(input).map_err(|e| ListError::io(input, e))?
    };
    let fetch_time = start.elapsed();

    let compile_start = Instant::now();
    let (rules, stats) = compile_filter_list(&text);
    let network_rules = generate_network_rules(&rules, &mut RuleIdAllocator::new());
    let compile_time = compile_start.elapsed();

    if let Some(path) = output {
        write_json(path, &rules)?;
    }
    if let Some(path) = network_output {
        write_json(path, &network_rules)?;
    }

    println!("Compiled '{}'", input);
    println!("  Lines:       {}", stats.parse.lines);
    println!(
        "  Parsed:      {} rules, {} exceptions, {} comments, {} skipped",
        stats.parse.rules, stats.parse.exceptions, stats.parse.comments, stats.parse.skipped
    );
    println!(
        "  Rules:       {} (suppressed {}, dedupe removed {})",
        stats.rules, stats.suppressed, stats.deduped
    );
    println!("  Network:     {} rules", network_rules.len());
    println!(
        "  Time:        {:.1}ms (load: {:.1}ms, compile: {:.1}ms)",
        start.elapsed().as_secs_f64() * 1000.0,
        fetch_time.as_secs_f64() * 1000.0,
        compile_time.as_secs_f64() * 1000.0,
    );

    Ok(())
}

async fn cmd_lists(cli: &Cli, command: &ListCommands) -> Result<(), ListError> {
    let fetcher = HttpFetcher::new(Duration::from_secs(cli.timeout))?;
    let registry = JsonFileRegistry::open(&cli.registry)?;
    let mut manager = BlockingListManager::new(JsonFileStore::new(&cli.store), fetcher, registry);

    match command {
        ListCommands::Add { name, url } => {
            let list = manager.create(name, url).await?;
            println!("Added '{}' ({})", list.name, list.id);
            println!("  Rules:       {}", list.rules.len());
            println!("  Network:     {} rules", list.rule_ids.len());
        }
        ListCommands::Refresh => {
            let report = manager.refresh_all().await?;
            println!(
                "Refreshed {} lists ({} failed, {} disabled)",
                report.refreshed,
                report.failed.len(),
                report.skipped_disabled
            );
            for id in &report.failed {
                println!("  failed: {id}");
            }
        }
        ListCommands::Watch { interval } => {
            let period = Duration::from_secs((*interval).max(1));
            tracing::info!(interval_secs = period.as_secs(), "watching blocking lists");
            manager.watch(period).await;
        }
        ListCommands::Toggle { id, enabled } => match manager.set_enabled(id, *enabled)? {
            Some(list) => println!(
                "'{}' is now {}",
                list.name,
                if list.enabled { "enabled" } else { "disabled" }
            ),
            None => println!("No list with id {id}"),
        },
        ListCommands::Delete { id } => match manager.delete(id)? {
            Some(list) => println!("Deleted '{}'", list.name),
            None => println!("No list with id {id}"),
        },
        ListCommands::Show { rules } => {
            if *rules {
                let rules = manager.enabled_rules()?;
                let text = serde_json::to_string_pretty(&rules).map_err(|e| ListError::json(&cli.store, e))?;
                println!("{text}");
                return Ok(());
            }

            let lists = manager.lists()?;
            if lists.is_empty() {
                println!("No blocking lists");
            }
            for list in &lists {
                println!(
                    "{}  {}  [{}]",
                    list.id,
                    list.name,
                    if list.enabled { "on" } else { "off" }
                );
                println!("  URL:         {}", list.url);
                println!(
                    "  Rules:       {} ({} network)",
                    list.rules.len(),
                    list.rule_ids.len()
                );
            }
            println!("Registered network rules: {}", manager.registry().rules().len());
        }
    }

    Ok(())
}
