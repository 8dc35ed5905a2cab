//! pact-router command line.
//!
//! ```text
//! routes.toml
//!     → config (load & validate)
//!     → SharedRouter (tree + analyzer + hot-path cache)
//!     → check | analyze | resolve | watch
//! ```
//!
//! `watch` keeps the router live: every valid edit of the route table is
//! published as a new snapshot while lookups continue against the old one.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use pact_router::config::{load_config, RouteTableConfig, RouteTableWatcher};
use pact_router::observability::{logging, metrics};
use pact_router::routing::{parse_method, AnalysisReport, MatchOutcome, SharedRouter, TreeStats};

#[derive(Parser)]
#[command(name = "pact-router")]
#[command(about = "Validate, analyze and exercise an HTTP route table", long_about = None)]
struct Cli {
    /// Route table file.
    #[arg(short, long, default_value = "routes.toml")]
    config: PathBuf,

    /// Overrides `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the route table and print a summary
    Check,
    /// Print the analyzer report as JSON
    Analyze,
    /// Resolve request paths for one method
    Resolve {
        method: String,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Reload routes whenever the file changes
    Watch {
        /// Serve Prometheus metrics on this address.
        #[arg(long)]
        metrics_addr: Option<SocketAddr>,
    },
}

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    report: &'a AnalysisReport,
    tree: TreeStats,
    cached_paths: Vec<&'a str>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    logging::init_logging(cli.log_level.as_deref().unwrap_or(&config.observability.log_level));

    tracing::info!(
        path = ?cli.config,
        routes = config.routes.len(),
        "Route table loaded"
    );

    let router = SharedRouter::from_config(&config)?;

    match cli.command {
        Commands::Check => {
            let snapshot = router.snapshot();
            let stats = snapshot.tree().stats();
            println!("OK: {} routes, {} nodes, {} endpoints", stats.routes, stats.nodes, stats.endpoints);
            println!(
                "hot paths: {}, cached: {}/{}",
                snapshot.report().hot_paths.len(),
                snapshot.cache().len(),
                snapshot.cache().capacity()
            );
        }
        Commands::Analyze => {
            let snapshot = router.snapshot();
            let mut cached_paths: Vec<&str> = snapshot.cache().paths().collect();
            cached_paths.sort_unstable();
            let output = AnalyzeOutput {
                report: snapshot.report(),
                tree: snapshot.tree().stats(),
                cached_paths,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Resolve { method, paths } => {
            let method = parse_method(&method)?;
            for path in &paths {
                let m = router.lookup(&method, path);
                match m.outcome {
                    MatchOutcome::Matched => {
                        let params: Vec<String> = m.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                        println!(
                            "{method} {path} -> {} ({}) {}",
                            m.handler.unwrap_or_default(),
                            m.pattern.unwrap_or_default(),
                            params.join(" ")
                        );
                    }
                    MatchOutcome::MethodNotAllowed => {
                        let allowed: Vec<&str> = m.allowed.iter().map(|m| m.as_str()).collect();
                        println!("{method} {path} -> 405 (allow: {})", allowed.join(", "));
                    }
                    MatchOutcome::PathNotFound => println!("{method} {path} -> 404"),
                }
            }
        }
        Commands::Watch { metrics_addr } => {
            watch(&cli.config, &config, &router, metrics_addr).await?;
        }
    }

    Ok(())
}

async fn watch(
    path: &Path,
    config: &RouteTableConfig,
    router: &SharedRouter<String>,
    metrics_addr: Option<SocketAddr>,
) -> Result<(), Box<dyn std::error::Error>> {
    let configured = if config.observability.metrics_enabled {
        config.observability.metrics_address.parse().ok()
    } else {
        None
    };
    if let Some(addr) = metrics_addr.or(configured) {
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
        }
    }

    let (watcher, mut updates) = RouteTableWatcher::new(path);
    let _handle = watcher.run()?;

    loop {
        tokio::select! {
            Some(config) = updates.recv() => {
                match router.reload(&config) {
                    Ok(()) => tracing::info!(version = router.version(), routes = router.len(), "Routes reloaded"),
                    Err(e) => tracing::error!(error = %e, "Rejected route table, keeping current routes"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    let stats = router.stats().snapshot();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
