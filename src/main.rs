use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use adshield_cli::{AppConfig, ShieldEngine};
use adshield_host_dom::{MemoryDom, PageSnapshot};
use adshield_kv_store::{JsonFileKv, KvStore, MemoryKv};
use adshield_pattern_store::PatternStore;
use adshield_safety_gate::AutoConfirmer;

#[derive(Parser)]
#[command(name = "adshield", version, about = "Adaptive ad classification and suppression engine")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON store for learned patterns, rules and exclusions
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// YAML file with safety limits and scan settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a page snapshot and report what would be suppressed
    Scan {
        /// Page snapshot JSON file
        snapshot: PathBuf,

        /// Run the heuristic pass, not just confirmed rules
        #[arg(long)]
        heuristics: bool,

        /// Answer yes to every safety-gate confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Print the learned pattern state
    Patterns,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let kv: Arc<dyn KvStore> = match &cli.store {
        Some(path) => Arc::new(JsonFileKv::open(path.clone())),
        None => Arc::new(MemoryKv::new()),
    };

    match cli.command {
        Command::Scan {
            snapshot,
            heuristics,
            yes,
        } => scan(cli.config.as_deref(), kv, &snapshot, heuristics, yes).await,
        Command::Patterns => patterns(kv),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn scan(
    config: Option<&std::path::Path>,
    kv: Arc<dyn KvStore>,
    snapshot: &std::path::Path,
    heuristics: bool,
    yes: bool,
) -> Result<()> {
    let config = AppConfig::load(config)?;
    let raw = std::fs::read_to_string(snapshot)
        .with_context(|| format!("reading {}", snapshot.display()))?;
    let page: PageSnapshot = serde_json::from_str(&raw).context("parsing page snapshot")?;
    let (dom, _root) = MemoryDom::from_snapshot(&page);
    let dom = Arc::new(dom);
    debug!(nodes = dom.node_count(), origin = %page.origin, "snapshot loaded");

    let engine = ShieldEngine::new(
        dom.clone(),
        kv,
        Arc::new(AutoConfirmer(yes)),
        config.safety,
        None,
    );

    let mut notices = engine.notices().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            println!("[{}] {}", notice.level, notice.message);
        }
    });

    engine.set_heuristics_enabled(heuristics).await;
    engine.scan_once(config.scan).await;

    println!("suppressed: {}", engine.rules().suppressed_count());
    for (_, candidate) in engine.rules().pending_candidates() {
        println!(
            "candidate: {} ({:.2}) [{}]",
            candidate.selector, candidate.confidence, candidate.reason
        );
    }
    for rule in engine.rules().rules() {
        println!("rule: {rule}");
    }
    printer.abort();
    Ok(())
}

fn patterns(kv: Arc<dyn KvStore>) -> Result<()> {
    let store = PatternStore::load(kv);
    let learned = store.snapshot();
    println!("{}", serde_json::to_string_pretty(&learned)?);
    Ok(())
}
