use crate::domain::money::Money;
use crate::domain::ports::{ArtifactRef, ArtifactStore, ProjectRepository};
use crate::domain::project::{HUMAN_ID_BASE, HumanId, NewProject, Project, ProjectId};
use crate::error::{Result, WorkflowError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory project store.
///
/// Revisions are checked under the write lock, so concurrent patches against
/// the same observed revision serialize into one winner and one `Conflict`.
/// Human-id allocation is a single atomic increment, which keeps suffixes
/// unique even when two creations race.
#[derive(Default, Clone)]
pub struct InMemoryProjectRepository {
    projects: Arc<RwLock<HashMap<ProjectId, Project>>>,
    next_id: Arc<AtomicU64>,
    human_seq: Arc<AtomicU64>,
}

impl InMemoryProjectRepository {
    /// Creates a new, empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn get(&self, id: ProjectId) -> Result<Option<Project>> {
        let projects = self.projects.read().await;
        Ok(projects.get(&id).cloned())
    }

    async fn patch(
        &self,
        id: ProjectId,
        expected_revision: u64,
        mut next: Project,
    ) -> Result<Project> {
        let mut projects = self.projects.write().await;
        let stored = projects
            .get(&id)
            .ok_or(WorkflowError::ProjectNotFound(id))?;
        if stored.revision != expected_revision {
            return Err(WorkflowError::Conflict {
                expected: expected_revision,
                found: stored.revision,
            });
        }
        next.revision = expected_revision + 1;
        projects.insert(id, next.clone());
        Ok(next)
    }

    async fn create_with_next_human_id(&self, prefix: &str, draft: NewProject) -> Result<Project> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let number = HUMAN_ID_BASE + self.human_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let project = Project {
            id,
            human_id: HumanId {
                prefix: prefix.to_string(),
                number,
            },
            name: draft.name,
            customer_name: draft.customer_name,
            city: draft.city,
            state: draft.state,
            stage_index: 1,
            sub_step_index: 1,
            stage_data: BTreeMap::new(),
            total_quote: Money::ZERO,
            payments: BTreeMap::new(),
            completed_at: None,
            revision: 1,
        };

        let mut projects = self.projects.write().await;
        projects.insert(id, project.clone());
        Ok(project)
    }

    async fn all_projects(&self) -> Result<Vec<Project>> {
        let projects = self.projects.read().await;
        Ok(projects.values().cloned().collect())
    }
}

/// An in-memory artifact store for tests and the replay binary.
///
/// References look like `mem://{project}/{field}/{n}`; content is retained
/// only so uploads have observable substance.
#[derive(Default, Clone)]
pub struct InMemoryArtifactStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    seq: Arc<AtomicU64>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn upload(&self, project: ProjectId, field: &str, bytes: Vec<u8>) -> Result<ArtifactRef> {
        let n = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = format!("mem://{project}/{field}/{n}");
        let mut blobs = self.blobs.write().await;
        blobs.insert(reference.clone(), bytes);
        Ok(reference)
    }
}
