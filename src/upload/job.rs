use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::naming::{build_filename, format_timestamp};
use crate::storage::{FileId, RecordId, RetrievalRef};

/// Labels captured when the job is created; never re-read from the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadMetadata {
    pub class_name: String,
    pub topic: String,
    pub created_at: DateTime<Local>,
}

impl UploadMetadata {
    pub fn new(
        class_name: impl Into<String>,
        topic: impl Into<String>,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            topic: topic.into(),
            created_at,
        }
    }
}

/// Commit progress of an [`UploadJob`]
///
/// `Done` follows `IndexCommitted` (or `HierarchyCommitted` when the
/// secondary upload succeeded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    ObjectStoreCommitted,
    IndexCommitted,
    HierarchyCommitted,
    Failed { reason: String },
    Done,
}

/// Outcome of the best-effort hierarchical upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HierarchyOutcome {
    Committed { file_id: FileId },
    /// No authenticated client was available
    Skipped,
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct UploadJob {
    session_id: Uuid,
    artifact: PathBuf,
    metadata: UploadMetadata,
    derived_name: String,
    status: JobStatus,
    hierarchy: Option<HierarchyOutcome>,
}

impl UploadJob {
    /// `extension` is the capture container extension (e.g. `m4a`)
    pub fn new(session_id: Uuid, artifact: PathBuf, metadata: UploadMetadata, extension: &str) -> Self {
        let stamp = format_timestamp(&metadata.created_at);
        let derived_name = build_filename(&metadata.class_name, &metadata.topic, &stamp, extension);

        Self {
            session_id,
            artifact,
            metadata,
            derived_name,
            status: JobStatus::Pending,
            hierarchy: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn metadata(&self) -> &UploadMetadata {
        &self.metadata
    }

    pub fn derived_name(&self) -> &str {
        &self.derived_name
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn hierarchy(&self) -> Option<&HierarchyOutcome> {
        self.hierarchy.as_ref()
    }

    pub(crate) fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }

    pub(crate) fn set_hierarchy(&mut self, outcome: HierarchyOutcome) {
        self.hierarchy = Some(outcome);
    }
}

/// Summary of a successful commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub session_id: Uuid,
    pub derived_name: String,
    pub object_key: String,
    pub retrieval_ref: RetrievalRef,
    pub record_id: RecordId,
    pub hierarchy: HierarchyOutcome,
    /// False if the local file could not be removed after commit
    pub artifact_removed: bool,
    pub status: JobStatus,
}
