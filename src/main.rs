use clap::Parser;
use miette::{IntoDiagnostic, Result};
use projectflow::application::engine::{AdvanceRequest, WorkflowEngine};
use projectflow::domain::money::{Money, PaymentAmount};
use projectflow::domain::ports::{ArtifactStoreBox, ProjectRepositoryBox};
use projectflow::domain::project::{FieldPatch, NewProject, locality_prefix};
use projectflow::domain::stage::StageRegistry;
use projectflow::error::WorkflowError;
use projectflow::infrastructure::in_memory::{InMemoryArtifactStore, InMemoryProjectRepository};
use projectflow::interfaces::csv::action_reader::{ActionReader, ActionRecord, ActionType};
use projectflow::interfaces::csv::project_writer::SummaryWriter;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input workflow actions CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn missing(column: &str, action: &str) -> WorkflowError {
    WorkflowError::ValidationError(format!("{action} action requires the '{column}' column"))
}

/// Applies one replayed action through the engine.
///
/// Mutating actions re-read the project first so the advance is conditioned
/// on the freshest revision, exactly as an interactive caller would.
async fn apply_action(
    engine: &WorkflowEngine,
    artifacts: &ArtifactStoreBox,
    action: ActionRecord,
) -> projectflow::error::Result<()> {
    match action.r#type {
        ActionType::Create => {
            let city = action.city.ok_or_else(|| missing("city", "create"))?;
            let draft = NewProject {
                name: action.name.ok_or_else(|| missing("name", "create"))?,
                customer_name: action.customer.ok_or_else(|| missing("customer", "create"))?,
                city: city.clone(),
                state: String::new(),
            };
            engine.create_project(&locality_prefix(&city), draft).await?;
            Ok(())
        }
        ActionType::Upload => {
            let id = action.project.ok_or_else(|| missing("project", "upload"))?;
            let field = action.field.ok_or_else(|| missing("field", "upload"))?;
            let content = action.value.ok_or_else(|| missing("value", "upload"))?;
            let reference = artifacts.upload(id, &field, content.into_bytes()).await?;

            let current = engine.get(id).await?;
            engine
                .advance(
                    id,
                    AdvanceRequest {
                        expected_revision: current.revision,
                        patch: FieldPatch::new().artifact(field, reference),
                        target_sub_step: action.sub,
                        target_stage: action.stage,
                    },
                )
                .await?;
            Ok(())
        }
        ActionType::Set => {
            let id = action.project.ok_or_else(|| missing("project", "set"))?;
            let field = action.field.ok_or_else(|| missing("field", "set"))?;
            let value = action.value.ok_or_else(|| missing("value", "set"))?;

            let current = engine.get(id).await?;
            engine
                .advance(
                    id,
                    AdvanceRequest {
                        expected_revision: current.revision,
                        patch: FieldPatch::new().text(field, value),
                        target_sub_step: action.sub,
                        target_stage: action.stage,
                    },
                )
                .await?;
            Ok(())
        }
        ActionType::Quote => {
            let id = action.project.ok_or_else(|| missing("project", "quote"))?;
            let amount = action.amount.ok_or_else(|| missing("amount", "quote"))?;
            let quote = Money::try_from(amount)?;

            let current = engine.get(id).await?;
            engine
                .advance(
                    id,
                    AdvanceRequest {
                        expected_revision: current.revision,
                        patch: FieldPatch::new().total_quote(quote),
                        target_sub_step: action.sub,
                        target_stage: action.stage,
                    },
                )
                .await?;
            Ok(())
        }
        ActionType::Pay => {
            let id = action.project.ok_or_else(|| missing("project", "pay"))?;
            let field = action.field.ok_or_else(|| missing("field", "pay"))?;
            let amount = action.amount.ok_or_else(|| missing("amount", "pay"))?;
            let payment = PaymentAmount::try_from(amount)?;

            let current = engine.get(id).await?;
            engine
                .advance(
                    id,
                    AdvanceRequest {
                        expected_revision: current.revision,
                        patch: FieldPatch::new().payment(field, payment),
                        target_sub_step: action.sub,
                        target_stage: action.stage,
                    },
                )
                .await?;
            Ok(())
        }
        ActionType::Advance => {
            let id = action.project.ok_or_else(|| missing("project", "advance"))?;

            let current = engine.get(id).await?;
            engine
                .advance(
                    id,
                    AdvanceRequest {
                        expected_revision: current.revision,
                        patch: FieldPatch::new(),
                        target_sub_step: action.sub,
                        target_stage: action.stage,
                    },
                )
                .await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let repository: ProjectRepositoryBox = if let Some(db_path) = cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            use projectflow::infrastructure::rocksdb::RocksDbProjectRepository;
            Box::new(RocksDbProjectRepository::open(db_path).into_diagnostic()?)
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = db_path;
            return Err(miette::miette!(
                "--db-path requires the 'storage-rocksdb' feature"
            ));
        }
    } else {
        Box::new(InMemoryProjectRepository::new())
    };
    let artifacts: ArtifactStoreBox = Box::new(InMemoryArtifactStore::new());

    let engine = WorkflowEngine::new(StageRegistry::standard(), repository);

    // Replay actions
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = ActionReader::new(file);
    for action_result in reader.actions() {
        match action_result {
            Ok(action) => {
                if let Err(e) = apply_action(&engine, &artifacts, action).await {
                    eprintln!("Error applying action: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading action: {}", e);
            }
        }
    }

    // Output final state
    let mut projects = engine.all_projects().await.into_diagnostic()?;
    projects.sort_by_key(|p| p.id);

    let stdout = io::stdout();
    let mut writer = SummaryWriter::new(stdout.lock());
    writer
        .write_projects(engine.registry(), projects)
        .into_diagnostic()?;

    Ok(())
}
