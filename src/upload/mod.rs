//! Artifact commit pipeline
//!
//! `UploadOrchestrator` sequences object store → index → hierarchical store →
//! local cleanup. `FolderResolver` materializes the semester/class/topic
//! folders in the hierarchical store.

mod folder;
mod job;
mod orchestrator;

pub use folder::{FolderPath, FolderResolver};
pub use job::{HierarchyOutcome, JobStatus, UploadJob, UploadMetadata, UploadReport};
pub use orchestrator::{object_key, OrchestratorConfig, UploadOrchestrator, UPLOADED_STATUS};

use anyhow::anyhow;
use std::future::Future;
use std::time::Duration;

/// Run a collaborator call with an upper bound on its duration
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| anyhow!("timed out after {:?}", limit))?
}
