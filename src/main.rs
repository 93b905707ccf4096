//! `ai-assign`: run the assignment pipeline from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use ai_assign::assignments::{ManualAssignment, manual_assign};
use ai_assign::config::AssignmentConfig;
use ai_assign::llm::{LlmConfig, create_provider};
use ai_assign::notify::{DisabledNotifier, Notifier, SmtpConfig, SmtpNotifier};
use ai_assign::pipeline::AssignmentPipeline;
use ai_assign::reasoning::{LlmReasoner, OfflineBackend, ReasoningBackend};
use ai_assign::store::{Database, LibSqlBackend};

/// Confidence-gated task assignment.
#[derive(Parser)]
#[command(name = "ai-assign", about = "Confidence-gated task assignment", version)]
struct Cli {
    /// Database file (overrides AI_ASSIGN_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one task and print the result as JSON.
    ///
    /// Workers and tasks are not created by this CLI; the database must
    /// already hold them.
    Run {
        task_id: Uuid,
        /// Minimum confidence for auto-assignment, in [0, 1].
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Assign a task by hand, bypassing the pipeline.
    ManualAssign {
        task_id: Uuid,
        worker_id: Uuid,
        #[arg(long, default_value_t = 0.0)]
        confidence: f64,
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Print a task's decision history, newest first.
    History { task_id: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // ── Database ─────────────────────────────────────────────────────────
    let db_path = cli.db.clone().unwrap_or_else(|| {
        PathBuf::from(
            std::env::var("AI_ASSIGN_DB_PATH").unwrap_or_else(|_| "./data/ai-assign.db".to_string()),
        )
    });
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?,
    );

    match cli.command {
        Commands::Run { task_id, threshold } => {
            let config = AssignmentConfig::from_env()?;
            let pipeline = AssignmentPipeline::new(
                Arc::clone(&db),
                reasoning_backend(&config)?,
                notifier(&config),
                config,
            );
            let result = pipeline.run_assignment(task_id, threshold).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::ManualAssign {
            task_id,
            worker_id,
            confidence,
            note,
        } => {
            let record = manual_assign(
                db.as_ref(),
                &ManualAssignment {
                    task_id,
                    worker_id,
                    confidence,
                    note,
                },
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::History { task_id } => {
            let history = db.list_decisions(task_id).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
    }

    Ok(())
}

/// LLM-backed reasoning when an API key is configured, offline heuristics otherwise.
fn reasoning_backend(config: &AssignmentConfig) -> anyhow::Result<Arc<dyn ReasoningBackend>> {
    match LlmConfig::from_env() {
        Some(llm_config) => {
            let llm = create_provider(&llm_config)?;
            Ok(Arc::new(LlmReasoner::new(llm, config.backend_timeout)))
        }
        None => {
            tracing::info!("No LLM API key set, using offline heuristics");
            Ok(Arc::new(OfflineBackend))
        }
    }
}

fn notifier(config: &AssignmentConfig) -> Arc<dyn Notifier> {
    if !config.notifications_enabled {
        return Arc::new(DisabledNotifier);
    }
    match SmtpConfig::from_env() {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, "Email notifications enabled");
            Arc::new(SmtpNotifier::new(smtp))
        }
        None => {
            tracing::info!("SMTP_HOST not set, notifications disabled");
            Arc::new(DisabledNotifier)
        }
    }
}
