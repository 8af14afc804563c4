use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::bounded;
use super::folder::{FolderPath, FolderResolver};
use super::job::{HierarchyOutcome, JobStatus, UploadJob, UploadReport};
use crate::error::{Error, Result};
use crate::naming::{lecture_title, semester_label};
use crate::storage::{
    ArtifactBody, FileId, HierarchyStore, IdentityProvider, IndexRecord, IndexStore, ObjectStore,
};

/// Upload naming and network settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Top folder in the hierarchical store
    pub app_root_folder: String,
    /// Term appended to the year in the semester folder
    pub semester_term: String,
    /// Index collection name
    pub collection: String,
    /// Object key prefix (`{prefix}/{uid}/{name}`)
    pub object_prefix: String,
    pub content_type: &'static str,
    /// Bound applied to every network call
    pub network_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            app_root_folder: "Study Buddy".to_string(),
            semester_term: "Spring".to_string(),
            collection: "lectures".to_string(),
            object_prefix: "audio".to_string(),
            content_type: "audio/mp4",
            network_timeout: Duration::from_secs(120),
        }
    }
}

/// Status written to every index record
pub const UPLOADED_STATUS: &str = "uploaded";

pub fn object_key(prefix: &str, uid: &str, derived_name: &str) -> String {
    format!("{}/{}/{}", prefix, uid, derived_name)
}

/// Commits an artifact to the object store, the index and (best effort) the
/// hierarchical store, in that order.
///
/// The local artifact is removed only after the object store and index
/// commits succeed. Any failure before that leaves it in place.
pub struct UploadOrchestrator {
    objects: Arc<dyn ObjectStore>,
    index: Arc<dyn IndexStore>,
    identity: Arc<dyn IdentityProvider>,
    config: OrchestratorConfig,
    in_flight: Mutex<HashSet<Uuid>>,
}

/// Releases the per-session commit slot on drop
struct InFlight<'a> {
    set: &'a Mutex<HashSet<Uuid>>,
    session_id: Uuid,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

impl UploadOrchestrator {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        index: Arc<dyn IndexStore>,
        identity: Arc<dyn IdentityProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            objects,
            index,
            identity,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn is_in_flight(&self, session_id: Uuid) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&session_id)
    }

    pub async fn commit(&self, job: &mut UploadJob) -> Result<UploadReport> {
        let _slot = self.claim(job.session_id())?;

        info!(
            "Committing session {} as '{}'",
            job.session_id(),
            job.derived_name()
        );

        match self.run(job).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Commit for session {} failed: {}", job.session_id(), e);
                job.set_status(JobStatus::Failed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn claim(&self, session_id: Uuid) -> Result<InFlight<'_>> {
        let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(session_id) {
            warn!("Commit already in flight for session {}", session_id);
            return Err(Error::CommitInProgress);
        }
        Ok(InFlight {
            set: &self.in_flight,
            session_id,
        })
    }

    async fn run(&self, job: &mut UploadJob) -> Result<UploadReport> {
        let timeout = self.config.network_timeout;

        let uploader = self
            .identity
            .current_identity()
            .await
            .ok_or(Error::NotAuthenticated)?;

        // Object store
        let key = object_key(&self.config.object_prefix, &uploader.uid, job.derived_name());
        let body = open_artifact(job.artifact(), self.config.content_type).await?;
        let retrieval_ref = bounded(timeout, self.objects.put(&key, body))
            .await
            .map_err(|source| Error::ObjectStoreFailure {
                key: key.clone(),
                source,
            })?;
        job.set_status(JobStatus::ObjectStoreCommitted);
        info!("Stored {} -> {}", key, retrieval_ref);

        // Index record. Failure here is fatal so no object stays unindexed
        // without the caller knowing.
        let created_at = job.metadata().created_at;
        let record = IndexRecord {
            user_id: uploader.uid.clone(),
            title: lecture_title(&created_at),
            recorded_at: created_at,
            status: UPLOADED_STATUS.to_string(),
            download_url: retrieval_ref.0.clone(),
        };
        let record_id = bounded(timeout, self.index.insert_record(&self.config.collection, &record))
            .await
            .map_err(|source| Error::IndexFailure { source })?;
        job.set_status(JobStatus::IndexCommitted);
        info!("Indexed {} in '{}'", record_id, self.config.collection);

        // Hierarchical store, best effort
        let hierarchy = self.commit_hierarchy(job).await;
        if matches!(hierarchy, HierarchyOutcome::Committed { .. }) {
            job.set_status(JobStatus::HierarchyCommitted);
        }
        job.set_hierarchy(hierarchy.clone());

        let artifact_removed = match tokio::fs::remove_file(job.artifact()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Committed but could not remove {}: {}",
                    job.artifact().display(),
                    e
                );
                false
            }
        };
        job.set_status(JobStatus::Done);

        info!("Commit for session {} done", job.session_id());

        Ok(UploadReport {
            session_id: job.session_id(),
            derived_name: job.derived_name().to_string(),
            object_key: key,
            retrieval_ref,
            record_id,
            hierarchy,
            artifact_removed,
            status: JobStatus::Done,
        })
    }

    async fn commit_hierarchy(&self, job: &UploadJob) -> HierarchyOutcome {
        let Some(store) = self.identity.hierarchy_client().await else {
            info!("No hierarchical client; skipping folder upload");
            return HierarchyOutcome::Skipped;
        };

        match self.upload_to_hierarchy(store.as_ref(), job).await {
            Ok(file_id) => {
                info!("Uploaded '{}' to hierarchy as {}", job.derived_name(), file_id);
                HierarchyOutcome::Committed { file_id }
            }
            Err(e) => {
                warn!(
                    "Hierarchical upload for session {} failed: {}",
                    job.session_id(),
                    e
                );
                HierarchyOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn upload_to_hierarchy(&self, store: &dyn HierarchyStore, job: &UploadJob) -> Result<FileId> {
        let timeout = self.config.network_timeout;
        let meta = job.metadata();
        let path = FolderPath::lecture(
            &self.config.app_root_folder,
            &semester_label(&meta.created_at, &self.config.semester_term),
            &meta.class_name,
            &meta.topic,
        );

        let folder = FolderResolver::new(store, timeout).resolve(&path, None).await?;

        let body = open_artifact(job.artifact(), self.config.content_type).await?;
        bounded(timeout, store.upload_file(&folder, job.derived_name(), body))
            .await
            .map_err(|source| Error::HierarchyFailure { source })
    }
}

async fn open_artifact(path: &Path, content_type: &'static str) -> Result<ArtifactBody> {
    let artifact_err = |source| Error::Artifact {
        path: path.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(artifact_err)?;
    let len = file.metadata().await.map_err(artifact_err)?.len();

    Ok(ArtifactBody {
        file,
        len,
        content_type,
    })
}
