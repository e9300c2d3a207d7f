#![allow(dead_code)]

use projectflow::application::engine::{AdvanceRequest, WorkflowEngine};
use projectflow::domain::finance;
use projectflow::domain::money::{Money, PaymentAmount};
use projectflow::domain::project::{FieldPatch, NewProject, Position, Project};
use projectflow::domain::stage::{Requirement, StageRegistry};
use projectflow::error::Result;
use projectflow::infrastructure::in_memory::InMemoryProjectRepository;

pub fn engine() -> WorkflowEngine {
    WorkflowEngine::new(
        StageRegistry::standard(),
        Box::new(InMemoryProjectRepository::new()),
    )
}

pub fn draft(name: &str, city: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        customer_name: "A. Mehta".to_string(),
        city: city.to_string(),
        state: "Maharashtra".to_string(),
    }
}

pub async fn create_villa(engine: &WorkflowEngine) -> Project {
    engine
        .create_project("MUM", draft("Villa Renovation", "Mumbai"))
        .await
        .unwrap()
}

/// Advances relative to the given snapshot's revision.
pub async fn advance(
    engine: &WorkflowEngine,
    project: &Project,
    patch: FieldPatch,
    target_sub_step: Option<u8>,
    target_stage: Option<u8>,
) -> Result<Project> {
    engine
        .advance(
            project.id,
            AdvanceRequest {
                expected_revision: project.revision,
                patch,
                target_sub_step,
                target_stage,
            },
        )
        .await
}

/// Synthesizes the evidence a sub-step requirement asks for.
pub fn evidence_for(requirement: &Requirement, project: &Project) -> FieldPatch {
    match requirement {
        Requirement::None => FieldPatch::new(),
        Requirement::ArtifactUploaded { field } => {
            FieldPatch::new().artifact(*field, format!("mem://{}/{field}/1", project.id))
        }
        Requirement::FieldNonEmpty { field } => FieldPatch::new().text(*field, "2026-08-06"),
        Requirement::FinancialGateMet {
            percent,
            paid_fields,
        } => {
            let due = finance::milestone_balance(
                project.total_quote,
                *percent,
                project.paid_total(paid_fields),
            );
            if due.is_zero() {
                FieldPatch::new()
            } else {
                FieldPatch::new().payment(
                    *paid_fields.last().unwrap(),
                    PaymentAmount::new(due.value()).unwrap(),
                )
            }
        }
    }
}

/// Walks a fresh project through every gate of every stage, promoting at each
/// boundary, and finally through the completed sentinel.
pub async fn run_to_completion(engine: &WorkflowEngine, quote: Money) -> Project {
    let mut project = create_villa(engine).await;
    project = advance(engine, &project, FieldPatch::new().total_quote(quote), None, None)
        .await
        .unwrap();

    let registry = engine.registry().clone();
    for stage_index in 1..=registry.stage_count() {
        let stage = registry.stage(stage_index).unwrap().clone();
        for (i, sub_step) in stage.sub_steps.iter().enumerate() {
            let sub_index = i as u8 + 1;
            assert_eq!(
                project.position(),
                Position {
                    stage: stage_index,
                    sub_step: sub_index
                }
            );
            let patch = evidence_for(&sub_step.requirement, &project);
            project = advance(engine, &project, patch, Some(sub_index + 1), None)
                .await
                .unwrap();
        }
        project = advance(engine, &project, FieldPatch::new(), None, Some(stage_index + 1))
            .await
            .unwrap();
    }
    project
}
