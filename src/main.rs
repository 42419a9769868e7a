use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};

use tierflow::analysis::{ContentAnalysis, ContentClassification};
use tierflow::content::ExtractionResult;
use tierflow::{PipelineConfig, PipelineSystem};

#[derive(Parser)]
#[command(name = "tierflow")]
#[command(about = "Agent-tiered content reading and task creation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pipeline configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store location, overrides the configured path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Run without the persistent store
    #[arg(long)]
    no_store: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read files or directories through the content-reading tier
    Read {
        #[arg(required = true)]
        paths: Vec<String>,

        #[arg(long)]
        json: bool,

        #[arg(long)]
        concurrency: Option<usize>,

        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Create the task queue for analysed content
    Tasks {
        /// JSON array of content analyses
        #[arg(long)]
        analyses: PathBuf,

        /// JSON content classification
        #[arg(long)]
        classification: PathBuf,

        #[arg(long)]
        content_id: String,

        #[arg(long)]
        json: bool,
    },
    /// Print the stored task queue for a content id
    Queue { content_id: String },
    /// List agents with their performance
    Agents,
    /// List registered file capabilities
    Capabilities,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    use tracing_subscriber::EnvFilter;

    let filter = if cli.verbose {
        EnvFilter::new("tierflow=debug,warn")
    } else {
        EnvFilter::new("tierflow=info,warn")
    };

    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.store.path = db.clone();
    }
    if cli.no_store {
        config.store.enabled = false;
    }
    if let Commands::Read {
        concurrency,
        chunk_size,
        ..
    } = &cli.command
    {
        if let Some(limit) = concurrency {
            config.reading.concurrency_limit = *limit;
        }
        if let Some(size) = chunk_size {
            config.reading.chunk_size = *size;
        }
    }

    let system = PipelineSystem::new(config).context("Failed to initialize pipeline")?;

    match cli.command {
        Commands::Read { paths, json, .. } => {
            info!("Reading {} path(s)", paths.len());
            let results = system.read_paths(&paths).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for result in &results {
                    print_extraction(result);
                }
                let failed = results.iter().filter(|r| !r.is_success()).count();
                println!("\n{} file(s), {} failed", results.len(), failed);
            }
        }
        Commands::Tasks {
            analyses,
            classification,
            content_id,
            json,
        } => {
            let raw = tokio::fs::read_to_string(&analyses)
                .await
                .with_context(|| format!("Failed to read {}", analyses.display()))?;
            let analyses: Vec<ContentAnalysis> =
                serde_json::from_str(&raw).context("Malformed analyses JSON")?;

            let raw = tokio::fs::read_to_string(&classification)
                .await
                .with_context(|| format!("Failed to read {}", classification.display()))?;
            let classification: ContentClassification =
                serde_json::from_str(&raw).context("Malformed classification JSON")?;

            let report = system
                .create_tasks(&analyses, &classification, &content_id)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for task in &report.tasks {
                    println!(
                        "[p{}] {:<24} {:<15} {}",
                        task.priority,
                        task.name,
                        format!("{:?}", task.task_type).to_lowercase(),
                        task.id
                    );
                }
                for failure in &report.failures {
                    eprintln!(
                        "FAILED {} ({}): {}",
                        failure.strategy, failure.agent_id, failure.message
                    );
                }
            }
        }
        Commands::Queue { content_id } => match system.stored_queue(&content_id)? {
            Some(tasks) => println!("{}", serde_json::to_string_pretty(&tasks)?),
            None => {
                eprintln!("No queue stored for '{}'", content_id);
                let known = system.stored_queues()?;
                if !known.is_empty() {
                    eprintln!("Stored queues: {}", known.join(", "));
                }
            }
        },
        Commands::Agents => {
            for agent in system.agents() {
                println!(
                    "{:<36} success={:.3} quality={:.3} avg={:.1}ms processed={}",
                    agent.id,
                    agent.performance.success_rate,
                    agent.performance.quality_score,
                    agent.performance.avg_processing_time_ms,
                    agent.processed_count
                );
            }
        }
        Commands::Capabilities => {
            for cap in system.capabilities() {
                println!(
                    "{:<12} max={:>12} ext=[{}] methods=[{}]",
                    cap.file_type,
                    cap.max_size,
                    cap.extensions.join(", "),
                    cap.reading_methods.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn print_extraction(result: &ExtractionResult) {
    if result.is_success() {
        let q = &result.metadata.quality;
        println!(
            "OK     {} [{}] {} chunks={} completeness={:.2} accuracy={:.2} readability={:.2}",
            result.path,
            result.metadata.file_type,
            result.metadata.extraction_method,
            result.chunks.len(),
            q.completeness,
            q.accuracy,
            q.readability
        );
    } else {
        println!(
            "FAILED {} [{}] {}",
            result.path,
            result.metadata.file_type,
            result.errors.join("; ")
        );
    }
}
