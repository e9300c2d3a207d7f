use crate::domain::project::{NewProject, Project, ProjectId};
use crate::error::Result;
use async_trait::async_trait;

/// Opaque durable reference returned by the artifact store.
pub type ArtifactRef = String;

/// Durable record store for the project aggregate.
///
/// Writes are conditional on the revision the caller observed; a store that
/// has moved on answers `Conflict` instead of overwriting. Human-id
/// allocation is the store's responsibility so the counter can be serialized
/// next to the data it numbers.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn get(&self, id: ProjectId) -> Result<Option<Project>>;

    /// Replaces the stored aggregate if its revision still equals
    /// `expected_revision`; returns the new snapshot with the revision bumped.
    async fn patch(&self, id: ProjectId, expected_revision: u64, next: Project)
    -> Result<Project>;

    /// Creates a project at stage 1, sub-step 1, atomically allocating the
    /// next human id under the given prefix.
    async fn create_with_next_human_id(&self, prefix: &str, draft: NewProject) -> Result<Project>;

    async fn all_projects(&self) -> Result<Vec<Project>>;
}

/// Content-addressed blob store for uploaded evidence.
///
/// The workflow only ever sees the returned reference; upload duration and
/// storage layout are the store's concern.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn upload(&self, project: ProjectId, field: &str, bytes: Vec<u8>) -> Result<ArtifactRef>;
}

pub type ProjectRepositoryBox = Box<dyn ProjectRepository>;
pub type ArtifactStoreBox = Box<dyn ArtifactStore>;
