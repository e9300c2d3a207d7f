//! Guards for sub-step and stage transitions.
//!
//! Everything the engine enforces about movement lives here so the rules are
//! written once: transitions are forward-only and one step at a time, a
//! sub-step is crossed only when its requirement holds against current data,
//! and a stage promotes only from the "all sub-steps satisfied" position.

use crate::domain::finance;
use crate::domain::project::{FieldValue, Position, Project};
use crate::domain::stage::{Requirement, StageDefinition, StageRegistry};
use crate::error::{Result, WorkflowError};

/// Evaluates a sub-step requirement against the project's present data.
pub fn requirement_satisfied(
    stage: &StageDefinition,
    requirement: &Requirement,
    project: &Project,
) -> bool {
    match requirement {
        Requirement::None => true,
        Requirement::ArtifactUploaded { field } => matches!(
            project.stage_field(stage.id, field),
            Some(value @ FieldValue::Artifact(_)) if !value.is_empty()
        ),
        Requirement::FieldNonEmpty { field } => project
            .stage_field(stage.id, field)
            .is_some_and(|value| !value.is_empty()),
        Requirement::FinancialGateMet {
            percent,
            paid_fields,
        } => finance::financial_gate_met(
            project.total_quote,
            *percent,
            project.paid_total(paid_fields),
        ),
    }
}

/// Checks that `target` is the next sub-step and that the current sub-step's
/// requirement is met, without mutating anything.
pub fn check_sub_step_advance(
    registry: &StageRegistry,
    project: &Project,
    target: u8,
) -> Result<()> {
    let stage = registry
        .stage(project.stage_index)
        .ok_or(WorkflowError::UnknownStage(project.stage_index))?;
    let step_count = stage.sub_steps.len() as u8;

    if project.sub_step_index == 0 || project.sub_step_index > step_count + 1 {
        return Err(WorkflowError::UnknownSubStep {
            stage: project.stage_index,
            sub_step: project.sub_step_index,
        });
    }

    let from = project.position();
    let to = Position {
        stage: project.stage_index,
        sub_step: target,
    };

    // Nothing left to cross once every sub-step is satisfied.
    if project.sub_step_index > step_count || target != project.sub_step_index + 1 {
        return Err(WorkflowError::IllegalTransition { from, to });
    }

    let current = &stage.sub_steps[project.sub_step_index as usize - 1];
    if !requirement_satisfied(stage, &current.requirement, project) {
        return Err(WorkflowError::GateNotSatisfied {
            position: from,
            requirement: current.requirement.to_string(),
        });
    }

    Ok(())
}

/// Checks that the active stage may promote to `target`.
///
/// Promotion requires the "all sub-steps satisfied" position
/// (`sub_step_index == step_count + 1`) and moves exactly one stage forward;
/// the sentinel index past the last stage closes the project.
pub fn check_stage_advance(registry: &StageRegistry, project: &Project, target: u8) -> Result<()> {
    let stage = registry
        .stage(project.stage_index)
        .ok_or(WorkflowError::UnknownStage(project.stage_index))?;
    let step_count = stage.sub_steps.len() as u8;

    if project.sub_step_index == 0 || project.sub_step_index > step_count + 1 {
        return Err(WorkflowError::UnknownSubStep {
            stage: project.stage_index,
            sub_step: project.sub_step_index,
        });
    }

    let from = project.position();
    let to = Position {
        stage: target,
        sub_step: 1,
    };

    if target != project.stage_index + 1 || project.sub_step_index != step_count + 1 {
        return Err(WorkflowError::IllegalTransition { from, to });
    }

    Ok(())
}
