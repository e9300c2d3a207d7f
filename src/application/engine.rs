use crate::domain::money::Money;
use crate::domain::ports::ProjectRepositoryBox;
use crate::domain::progress;
use crate::domain::project::{FieldPatch, NewProject, Project, ProjectId};
use crate::domain::stage::{StageDefinition, StageRegistry};
use crate::domain::validation;
use crate::error::{Result, WorkflowError};
use chrono::Utc;

/// A validated request to mutate a project.
///
/// `expected_revision` is the revision the caller observed when it read the
/// project; the whole request fails with `Conflict` if the store has moved
/// on. `target_sub_step` and `target_stage` are optional one-step advances
/// evaluated after the patch is applied.
#[derive(Debug, Clone, Default)]
pub struct AdvanceRequest {
    pub expected_revision: u64,
    pub patch: FieldPatch,
    pub target_sub_step: Option<u8>,
    pub target_stage: Option<u8>,
}

/// The stage-gated workflow engine.
///
/// Stateless between calls: each `advance` reads the aggregate, validates the
/// requested move against the stage catalog, and writes back conditionally.
/// The returned snapshot is the single source of truth for callers; they
/// re-render from it instead of keeping a parallel copy.
pub struct WorkflowEngine {
    registry: StageRegistry,
    projects: ProjectRepositoryBox,
}

impl WorkflowEngine {
    pub fn new(registry: StageRegistry, projects: ProjectRepositoryBox) -> Self {
        Self { registry, projects }
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Read-only stage catalog, for rendering layers.
    pub fn stage_definitions(&self) -> &[StageDefinition] {
        self.registry.stages()
    }

    /// Creates a project at stage 1, sub-step 1.
    ///
    /// The human-id prefix is an explicit caller choice (billing city vs
    /// site city is a policy decision above this layer).
    pub async fn create_project(&self, prefix: &str, draft: NewProject) -> Result<Project> {
        let project = self
            .projects
            .create_with_next_human_id(prefix, draft)
            .await?;
        tracing::info!(
            project = project.id,
            human_id = %project.human_id,
            "project created"
        );
        Ok(project)
    }

    pub async fn get(&self, id: ProjectId) -> Result<Project> {
        self.projects
            .get(id)
            .await?
            .ok_or(WorkflowError::ProjectNotFound(id))
    }

    pub async fn all_projects(&self) -> Result<Vec<Project>> {
        self.projects.all_projects().await
    }

    /// Applies a field patch and optional one-step advances as one atomic
    /// unit.
    ///
    /// The patch lands first, then the current sub-step's requirement is
    /// re-evaluated against the patched data; any failure leaves the store
    /// untouched. A stage promotion to the sentinel index closes the project
    /// and stamps `completed_at`.
    pub async fn advance(&self, id: ProjectId, request: AdvanceRequest) -> Result<Project> {
        let stored = self
            .projects
            .get(id)
            .await?
            .ok_or(WorkflowError::ProjectNotFound(id))?;

        let completed_index = self.registry.completed_stage_index();
        if stored.stage_index >= completed_index {
            return Err(WorkflowError::ProjectClosed(id));
        }
        if stored.revision != request.expected_revision {
            return Err(WorkflowError::Conflict {
                expected: request.expected_revision,
                found: stored.revision,
            });
        }

        let mut next = stored;
        self.apply_patch(&mut next, &request.patch)?;

        if let Some(target) = request.target_sub_step {
            validation::check_sub_step_advance(&self.registry, &next, target)?;
            next.sub_step_index = target;
            tracing::debug!(project = id, position = %next.position(), "sub-step confirmed");
        }

        if let Some(target) = request.target_stage {
            validation::check_stage_advance(&self.registry, &next, target)?;
            next.stage_index = target;
            next.sub_step_index = 1;
            if target == completed_index {
                next.completed_at = Some(Utc::now());
                tracing::info!(project = id, "project completed");
            } else {
                tracing::info!(project = id, stage = target, "stage promoted");
            }
        }

        self.projects
            .patch(id, request.expected_revision, next)
            .await
    }

    /// Derives the aggregate completion percentage for a snapshot.
    pub fn progress_percent(&self, project: &Project) -> u8 {
        progress::progress_percent(&self.registry, project)
    }

    fn apply_patch(&self, project: &mut Project, patch: &FieldPatch) -> Result<()> {
        let stage = self
            .registry
            .stage(project.stage_index)
            .ok_or(WorkflowError::UnknownStage(project.stage_index))?;

        if !patch.fields.is_empty() {
            let data = project.stage_data.entry(stage.id.to_string()).or_default();
            for (field, value) in &patch.fields {
                data.insert(field.clone(), value.clone());
            }
        }
        if let Some(quote) = patch.total_quote {
            project.total_quote = quote;
        }
        for (field, amount) in &patch.payments {
            let entry = project
                .payments
                .entry(field.clone())
                .or_insert(Money::ZERO);
            *entry += Money::from(*amount);
        }
        Ok(())
    }
}
