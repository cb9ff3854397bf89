use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::info;

use reward_engine::cohort::CohortEngine;
use reward_engine::config::Config;
use reward_engine::content_index::{ContentIndex, HashingEncoder, SqliteContentIndex};
use reward_engine::db::ScoreStore;
use reward_engine::gibberish::GibberishClassifier;
use reward_engine::quality::{QualityScorer, RemoteQualityScorer};
use reward_engine::queue::{JobQueue, SqliteJobQueue, WorkerPool};
use reward_engine::router::{build_post_job_handler, IntakeRouter};
use reward_engine::validator::Validator;
use reward_engine::webhook::WebhookDispatcher;

/// reward-engine: scoring and reward-qualification for a social platform's
/// interactions (posts, likes, comments, crypto transactions, tips,
/// referrals).
#[derive(Parser)]
#[command(name = "reward-engine", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the score store, content index, and job queue schemas
    Init,

    /// Start the HTTP server (intake router + admin endpoints)
    #[cfg(feature = "web")]
    Serve {
        /// Number of workers pulling post/comment jobs off the queue
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Run the daily cohort engine (C10) once
    RunDailyAnalysis,

    /// Show score-store, content-index, and job-queue stats
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reward_engine=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let config = Config::load()?;
            let store = open_store(&config).await?;
            let _ = open_content_index(&config)?;
            let _ = open_queue(&config)?;
            info!("initialized reward-engine schemas");
            println!("Score store: {}", config.db_path);
            println!("Content index: {}", config.vector_store_path);
            println!("Job queue: {}", config.queue_path);
            drop(store);
            println!("\nreward-engine is ready. Next step: set up your .env file");
            println!("  (QUALITY_MODEL_ENDPOINT / QUALITY_MODEL_API_KEY are required");
            println!("   for post validation; without them quality scoring degrades to 5)");
        }

        #[cfg(feature = "web")]
        Commands::Serve { workers } => {
            let config = Config::load()?;
            let worker_count = workers.unwrap_or(config.worker_count);

            let store = open_store(&config).await?;
            let content_index = open_content_index(&config)?;
            let queue = open_queue(&config)?;

            let validator = Arc::new(Validator::new(
                Arc::clone(&content_index),
                gibberish_classifier(&config),
                quality_scorer(&config),
            ));
            let dispatcher = Arc::new(WebhookDispatcher::new());

            let handler = build_post_job_handler(
                Arc::clone(&store),
                Arc::clone(&validator),
                Arc::clone(&dispatcher),
                config.clone(),
            );
            let pool = WorkerPool::spawn(Arc::clone(&queue), worker_count, handler);

            let router = Arc::new(IntakeRouter::new(
                Arc::clone(&store),
                Arc::clone(&content_index),
                Arc::clone(&queue),
                config.points.clone(),
            ));
            let cohort_engine = Arc::new(CohortEngine::new(Arc::clone(&store), config.points.clone()));

            let state = reward_engine::web::AppState {
                router,
                cohort_engine,
                store: Arc::clone(&store),
                last_cohort_summary: Arc::new(RwLock::new(None)),
            };

            info!(worker_count, "starting {} workers", worker_count);
            let result = reward_engine::web::run_server(state, &config.bind_addr, config.port).await;

            pool.shutdown().await;
            result?;
        }

        Commands::RunDailyAnalysis => {
            let config = Config::load()?;
            let store = open_store(&config).await?;
            let engine = CohortEngine::new(store, config.points.clone());

            println!("Running daily cohort analysis...");
            let summary = engine.run().await?;

            for (category, cohort) in &summary {
                println!(
                    "  {category}: {} qualified, {} empathy",
                    cohort.qualified.len(),
                    cohort.empathy.len()
                );
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let store = open_store(&config).await?;
            let content_index = open_content_index(&config)?;
            let queue = open_queue(&config)?;

            reward_engine::status::show(&store, &content_index, &queue, &config.db_path).await?;
        }
    }

    Ok(())
}

async fn open_store(config: &Config) -> Result<Arc<dyn ScoreStore>> {
    if !config.postgres_url.is_empty() {
        #[cfg(feature = "postgres")]
        {
            info!("using PostgreSQL score store");
            let store = reward_engine::db::PgScoreStore::connect(&config.postgres_url).await?;
            return Ok(Arc::new(store));
        }
        #[cfg(not(feature = "postgres"))]
        anyhow::bail!(
            "POSTGRES_URL is set but the 'postgres' feature is not compiled in.\n\
             Rebuild with: cargo build --features postgres"
        );
    }

    let store = reward_engine::db::SqliteScoreStore::open(&config.db_path)?;
    Ok(Arc::new(store))
}

fn open_content_index(config: &Config) -> Result<Arc<dyn ContentIndex>> {
    let index = SqliteContentIndex::open(&config.vector_store_path, Arc::new(HashingEncoder))?;
    Ok(Arc::new(index))
}

fn open_queue(config: &Config) -> Result<Arc<dyn JobQueue>> {
    let queue = SqliteJobQueue::open(&config.queue_path, config.queue_visibility_timeout)?;
    Ok(Arc::new(queue))
}

fn gibberish_classifier(config: &Config) -> GibberishClassifier {
    #[cfg(feature = "ml-classifier")]
    {
        use std::path::Path;
        match reward_engine::gibberish::ml::OnnxGibberishModel::load(Path::new(
            &config.gibberish_model_dir,
        )) {
            Ok(model) => return GibberishClassifier::new(Some(Arc::new(model))),
            Err(err) => {
                tracing::warn!("gibberish ML classifier unavailable, running rule+statistical only: {err:#}");
            }
        }
    }
    #[cfg(not(feature = "ml-classifier"))]
    let _ = config;

    GibberishClassifier::without_ml()
}

fn quality_scorer(config: &Config) -> Arc<dyn QualityScorer> {
    Arc::new(RemoteQualityScorer::new(
        config.quality_model_endpoint.clone(),
        config.quality_model_api_key.clone(),
    ))
}
