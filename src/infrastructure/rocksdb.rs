use crate::domain::money::Money;
use crate::domain::ports::ProjectRepository;
use crate::domain::project::{HUMAN_ID_BASE, HumanId, NewProject, Project, ProjectId};
use crate::error::{Result, WorkflowError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for project aggregates.
pub const CF_PROJECTS: &str = "projects";
/// Column Family for allocation counters.
pub const CF_META: &str = "meta";

const KEY_NEXT_PROJECT_ID: &[u8] = b"next_project_id";
const KEY_HUMAN_ID_SEQ: &[u8] = b"human_id_seq";

/// A persistent project store backed by RocksDB.
///
/// Aggregates are stored as JSON under their numeric id; the id and human-id
/// counters live in a separate column family so they survive restarts.
/// Counter allocation and conditional patches run under a single mutex,
/// which serializes read-modify-write cycles within the process.
#[derive(Clone)]
pub struct RocksDbProjectRepository {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

fn storage_err<E>(err: E) -> WorkflowError
where
    E: std::error::Error + Send + Sync + 'static,
{
    WorkflowError::StorageUnavailable(Box::new(err))
}

impl RocksDbProjectRepository {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_projects = ColumnFamilyDescriptor::new(CF_PROJECTS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_projects, cf_meta])
            .map_err(storage_err)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            storage_err(std::io::Error::other(format!(
                "column family '{name}' not found"
            )))
        })
    }

    fn read_counter(&self, key: &[u8]) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        let stored = self.db.get_cf(cf, key).map_err(storage_err)?;
        match stored {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    storage_err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "counter is not 8 bytes",
                    ))
                })?;
                Ok(u64::from_be_bytes(bytes))
            }
            None => Ok(0),
        }
    }

    fn write_counter(&self, key: &[u8], value: u64) -> Result<()> {
        let cf = self.cf(CF_META)?;
        self.db
            .put_cf(cf, key, value.to_be_bytes())
            .map_err(storage_err)
    }

    fn read_project(&self, id: ProjectId) -> Result<Option<Project>> {
        let cf = self.cf(CF_PROJECTS)?;
        let stored = self.db.get_cf(cf, id.to_be_bytes()).map_err(storage_err)?;
        match stored {
            Some(bytes) => {
                let project = serde_json::from_slice(&bytes).map_err(storage_err)?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    fn write_project(&self, project: &Project) -> Result<()> {
        let cf = self.cf(CF_PROJECTS)?;
        let value = serde_json::to_vec(project).map_err(storage_err)?;
        self.db
            .put_cf(cf, project.id.to_be_bytes(), value)
            .map_err(storage_err)
    }
}

#[async_trait]
impl ProjectRepository for RocksDbProjectRepository {
    async fn get(&self, id: ProjectId) -> Result<Option<Project>> {
        self.read_project(id)
    }

    async fn patch(
        &self,
        id: ProjectId,
        expected_revision: u64,
        mut next: Project,
    ) -> Result<Project> {
        let _guard = self.write_lock.lock().await;
        let stored = self
            .read_project(id)?
            .ok_or(WorkflowError::ProjectNotFound(id))?;
        if stored.revision != expected_revision {
            return Err(WorkflowError::Conflict {
                expected: expected_revision,
                found: stored.revision,
            });
        }
        next.revision = expected_revision + 1;
        self.write_project(&next)?;
        Ok(next)
    }

    async fn create_with_next_human_id(&self, prefix: &str, draft: NewProject) -> Result<Project> {
        let _guard = self.write_lock.lock().await;
        let id = self.read_counter(KEY_NEXT_PROJECT_ID)? + 1;
        let seq = self.read_counter(KEY_HUMAN_ID_SEQ)? + 1;
        self.write_counter(KEY_NEXT_PROJECT_ID, id)?;
        self.write_counter(KEY_HUMAN_ID_SEQ, seq)?;

        let project = Project {
            id,
            human_id: HumanId {
                prefix: prefix.to_string(),
                number: HUMAN_ID_BASE + seq,
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
        self.write_project(&project)?;
        Ok(project)
    }

    async fn all_projects(&self) -> Result<Vec<Project>> {
        let cf = self.cf(CF_PROJECTS)?;
        let mut projects = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item.map_err(storage_err)?;
            let project: Project = serde_json::from_slice(&value).map_err(storage_err)?;
            projects.push(project);
        }
        Ok(projects)
    }
}
