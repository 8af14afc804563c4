use anyhow::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::fs::File;

/// Durable reference to a committed object (e.g. a download URL)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetrievalRef(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

/// Identifier of a folder in the hierarchical store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub String);

macro_rules! display_inner {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })*
    };
}

display_inner!(RetrievalRef, RecordId, FolderId, FileId);

/// Authenticated uploader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uploader {
    pub uid: String,
    pub display_name: Option<String>,
}

/// Streamed artifact body
#[derive(Debug)]
pub struct ArtifactBody {
    pub file: File,
    pub len: u64,
    pub content_type: &'static str,
}

/// Index record describing one committed recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    pub user_id: String,
    pub title: String,
    pub recorded_at: DateTime<Local>,
    pub status: String,
    pub download_url: String,
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, body: ArtifactBody) -> Result<RetrievalRef>;
}

#[async_trait::async_trait]
pub trait IndexStore: Send + Sync {
    async fn insert_record(&self, collection: &str, record: &IndexRecord) -> Result<RecordId>;
}

/// Tree-structured store addressed by named folders
#[async_trait::async_trait]
pub trait HierarchyStore: Send + Sync {
    /// Exact-name lookup under `parent` (the store root when `None`)
    async fn find_folder(&self, name: &str, parent: Option<&FolderId>) -> Result<Option<FolderId>>;

    async fn create_folder(&self, name: &str, parent: Option<&FolderId>) -> Result<FolderId>;

    async fn upload_file(&self, parent: &FolderId, name: &str, body: ArtifactBody) -> Result<FileId>;
}

/// Identity collaborator
///
/// The credential is read-only to the core.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when nobody is signed in
    async fn current_identity(&self) -> Option<Uploader>;

    /// Client for the hierarchical store. `None` when silent auth yields
    /// nothing, which skips the hierarchical upload.
    async fn hierarchy_client(&self) -> Option<Arc<dyn HierarchyStore>>;
}
