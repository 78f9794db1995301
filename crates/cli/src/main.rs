use anyhow::{anyhow, bail, Context, Result};
use catalog::{build_guest_history, CatalogIndex, GuestId};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use engine::config::{DEFAULT_BLOCK_SIZE, DEFAULT_DECAY_FACTOR, DEFAULT_TOP_N};
use engine::EngineConfig;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use server::{GuestRecommendation, RecommendationOrchestrator};
use simulation::keywords::DEFAULT_KEYWORDS_PER_CLUSTER;
use simulation::{SimulatedDataset, SimulationParams};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// MenuRecs - Daily Menu Recommendation Engine
#[derive(Parser)]
#[command(name = "menu-recs")]
#[command(about = "Daily menu recommendations from cluster affinity", long_about = None)]
struct Cli {
    /// Path to the dataset directory
    #[arg(short, long, default_value = "data/menu")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Engine parameters shared by every scoring command
#[derive(Args, Debug, Clone, Copy)]
struct EngineArgs {
    /// Number of new items to recommend
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Transactions per recency block
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Weight multiplier per block further into the past, at least 0
    #[arg(long, default_value_t = DEFAULT_DECAY_FACTOR)]
    decay_factor: f64,
}

impl From<EngineArgs> for EngineConfig {
    fn from(args: EngineArgs) -> Self {
        EngineConfig::new()
            .with_top_n(args.top_n)
            .with_block_size(args.block_size)
            .with_decay_factor(args.decay_factor)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a simulated dataset to the data directory
    Generate {
        /// Number of clusters
        #[arg(long, default_value = "7")]
        clusters: usize,

        /// Items in each cluster
        #[arg(long, default_value = "7")]
        items_per_cluster: usize,

        /// Keyword columns owned by each cluster
        #[arg(long, default_value_t = DEFAULT_KEYWORDS_PER_CLUSTER)]
        keywords_per_cluster: usize,

        /// Number of guests
        #[arg(long, default_value = "10")]
        guests: usize,

        /// Days of transactions
        #[arg(long, default_value = "31")]
        days: u32,

        /// Items on today's menu
        #[arg(long, default_value = "10")]
        daily_items: usize,

        /// Seed for a reproducible dataset
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Get today's recommendations for a guest
    Recommend {
        /// Guest ID to get recommendations for
        #[arg(long)]
        guest_id: GuestId,

        #[command(flatten)]
        engine: EngineArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Show the cluster ranking behind the recommendations
        #[arg(long)]
        explain: bool,
    },

    /// Show guest profile, history and cluster affinity
    Guest {
        /// Guest ID to display
        #[arg(long)]
        guest_id: GuestId,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Show the medoid of every cluster
    Medoids,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,

        /// Submit every request as one fan-out instead of timing each one
        #[arg(long)]
        fan_out: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            clusters,
            items_per_cluster,
            keywords_per_cluster,
            guests,
            days,
            daily_items,
            seed,
        } => {
            let params = SimulationParams {
                num_clusters: clusters,
                items_per_cluster,
                keywords_per_cluster,
                num_guests: guests,
                num_days: days,
                daily_items,
            };
            handle_generate(&cli.data_dir, &params, seed)?
        }
        Commands::Recommend {
            guest_id,
            engine,
            json,
            explain,
        } => {
            let data_index = load_index(&cli.data_dir, json)?;
            handle_recommend(data_index, guest_id, engine.into(), json, explain)?
        }
        Commands::Guest { guest_id, engine } => {
            let data_index = load_index(&cli.data_dir, false)?;
            handle_guest(data_index, guest_id, engine.into())?
        }
        Commands::Medoids => {
            let data_index = load_index(&cli.data_dir, false)?;
            handle_medoids(data_index)?
        }
        Commands::Benchmark {
            requests,
            concurrent,
            fan_out,
            engine,
        } => {
            let data_index = load_index(&cli.data_dir, false)?;
            handle_benchmark(data_index, requests, concurrent, engine.into(), fan_out).await?
        }
    }

    Ok(())
}

/// Load the dataset files into a shared index
fn load_index(data_dir: &Path, quiet: bool) -> Result<Arc<CatalogIndex>> {
    if !quiet {
        println!("Loading dataset from {}...", data_dir.display());
    }
    let start = Instant::now();
    let data_index = Arc::new(
        CatalogIndex::load_from_files(data_dir).context("Failed to load menu dataset")?,
    );
    if !quiet {
        println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());
    }
    Ok(data_index)
}

/// Handle the 'generate' command
fn handle_generate(data_dir: &Path, params: &SimulationParams, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let dataset = SimulatedDataset::generate(params, &mut rng)?;
    dataset.write_to_dir(data_dir)?;
    info!("Dataset written to {}", data_dir.display());

    println!(
        "{} Wrote {} items, {} guests, {} transactions and a {}-item menu to {}",
        "✓".green(),
        dataset.items.len(),
        dataset.guests.len(),
        dataset.transactions.len(),
        dataset.menu.len(),
        data_dir.display()
    );
    if let (Some(first), Some(last)) = (dataset.guests.first(), dataset.guests.last()) {
        println!("Guest IDs range {}-{}", first.id, last.id);
    }
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    data_index: Arc<CatalogIndex>,
    guest_id: GuestId,
    config: EngineConfig,
    json: bool,
    explain: bool,
) -> Result<()> {
    // Check if guest exists
    data_index
        .get_guest(guest_id)
        .ok_or_else(|| anyhow!("Guest {} not found", guest_id))?;

    let orchestrator = RecommendationOrchestrator::new(data_index, config)?;
    let recommendation = orchestrator.get_recommendations(guest_id)?;

    if json {
        let report = serde_json::json!({
            "config": orchestrator.config(),
            "recommendation": &recommendation,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_recommendation(&recommendation);
    if explain {
        print_ranking(&orchestrator, &recommendation);
    }
    Ok(())
}

/// Handle the 'guest' command
fn handle_guest(data_index: Arc<CatalogIndex>, guest_id: GuestId, config: EngineConfig) -> Result<()> {
    let history = build_guest_history(&data_index, guest_id)
        .with_context(|| format!("Guest {} not found", guest_id))?;

    println!("{}", format!("Guest ID: {}", guest_id).bold().blue());
    println!("{}Name: {}", "• ".green(), history.guest.name);
    println!("{}Transactions: {}", "• ".cyan(), history.len());
    println!("{}Distinct items: {}", "• ".cyan(), history.seen.len());

    let transactions = data_index.get_guest_transactions(guest_id);
    if !transactions.is_empty() {
        println!("Most recent items:");
        for tx in transactions.iter().rev().take(5) {
            let cluster = data_index
                .get_item(tx.serial_id)
                .map(|item| item.cluster_label.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!("  - Day {}: Item #{} (cluster {})", tx.day, tx.serial_id, cluster);
        }
    }

    let orchestrator = RecommendationOrchestrator::new(data_index, config)?;
    let recommendation = orchestrator.get_recommendations(guest_id)?;
    print_ranking(&orchestrator, &recommendation);
    Ok(())
}

/// Handle the 'medoids' command
fn handle_medoids(data_index: Arc<CatalogIndex>) -> Result<()> {
    let orchestrator = RecommendationOrchestrator::new(data_index.clone(), EngineConfig::default())?;

    println!("{}", "Cluster medoids:".bold().blue());
    for medoid in orchestrator.medoids().iter() {
        println!(
            "{} Item #{} ({} members) {}",
            format!("Cluster {}:", medoid.cluster_label).green(),
            medoid.serial_id,
            data_index.get_items_by_cluster(medoid.cluster_label).len(),
            medoid.features
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    data_index: Arc<CatalogIndex>,
    requests: usize,
    concurrent: usize,
    config: EngineConfig,
    fan_out: bool,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }

    let guest_ids: Vec<GuestId> = data_index.guests().map(|guest| guest.id).collect();
    if guest_ids.is_empty() {
        bail!("Dataset has no guests to benchmark");
    }

    let orchestrator = RecommendationOrchestrator::new(data_index, config)?;

    // Pick random guests for each request
    let mut rng = rand::rng();
    let targets: Vec<GuestId> = (0..requests)
        .filter_map(|_| guest_ids.choose(&mut rng).copied())
        .collect();

    if fan_out {
        let start = Instant::now();
        let batch = orchestrator.recommend_many(&targets).await?;
        let total_time = start.elapsed();

        println!("{}", "Fan-out benchmark results:".bold().blue());
        println!("Requests: {}", batch.len());
        println!("Total time: {:?}", total_time);
        println!(
            "Throughput: {:.2} requests/second",
            batch.len() as f64 / total_time.as_secs_f64()
        );
        return Ok(());
    }

    // Individual requests, `concurrent` at a time, each timed on its own
    let wall_clock = Instant::now();
    let mut timings = Vec::with_capacity(targets.len());
    for batch in targets.chunks(concurrent.max(1)) {
        let handles: Vec<_> = batch
            .iter()
            .map(|&guest_id| {
                let orchestrator = orchestrator.clone();
                tokio::task::spawn_blocking(move || {
                    let start = Instant::now();
                    orchestrator.get_recommendations(guest_id)?;
                    Ok::<_, anyhow::Error>(start.elapsed())
                })
            })
            .collect();
        for handle in handles {
            timings.push(handle.await??);
        }
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let total_latency: Duration = timings.iter().sum();
    let avg_latency = total_latency / timings.len() as u32;

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!(
        "Throughput: {:.2} requests/second",
        requests as f64 / total_time.as_secs_f64()
    );

    Ok(())
}

/// Value at quantile `q` of sorted, non-empty `timings`
fn percentile(timings: &[Duration], q: f64) -> Duration {
    let position = (timings.len() as f64 * q) as usize;
    timings[position.min(timings.len() - 1)]
}

/// Greeting, new recommendations, and items from today's menu already tried
fn print_recommendation(recommendation: &GuestRecommendation) {
    println!();
    println!("{}", format!("Hello {}!", recommendation.guest_name).bold());
    println!();

    println!("{}", "Your recommendations for today are:".bold().blue());
    println!();
    if recommendation.result.new_items.is_empty() {
        println!("<no items to show>");
    }
    for serial_id in &recommendation.result.new_items {
        println!("{}", format!("Item #{}", serial_id).green());
    }

    println!();
    println!(
        "In the last {} days, you also tried:",
        recommendation.history_len
    );
    println!();
    if recommendation.result.seen_items.is_empty() {
        println!("<no items to show>");
    }
    for serial_id in &recommendation.result.seen_items {
        println!("Item #{}", serial_id);
    }
    println!();
    println!("from today's menu.");
}

/// Cluster ranking with affinity scores and medoids
fn print_ranking(orchestrator: &RecommendationOrchestrator, recommendation: &GuestRecommendation) {
    println!();
    match &recommendation.ranking {
        server::RankingPolicy::Affinity => {
            println!("{}", "Cluster affinity:".bold().blue());
        }
        server::RankingPolicy::Uniform { reason } => {
            println!(
                "{} {}",
                "Cluster affinity (uniform fallback):".bold().yellow(),
                reason
            );
        }
    }

    for (rank, cluster) in recommendation.affinity.ranked_clusters().iter().enumerate() {
        let score = recommendation.affinity.get(*cluster).unwrap_or(0.0);
        let medoid = orchestrator
            .medoids()
            .get(*cluster)
            .map(|m| format!("medoid Item #{}", m.serial_id))
            .unwrap_or_default();
        println!(
            "{}. Cluster {} - Affinity: {:.3} {}",
            (rank + 1).to_string().green(),
            cluster,
            score,
            medoid
        );
    }
}
