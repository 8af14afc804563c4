//! Remote store collaborators
//!
//! The core only sees these traits. `local` provides filesystem-backed
//! implementations for the binary and for tests.

pub mod backend;
pub mod local;

pub use backend::{
    ArtifactBody, FileId, FolderId, HierarchyStore, IdentityProvider, IndexRecord, IndexStore,
    ObjectStore, RecordId, RetrievalRef, Uploader,
};
pub use local::{LocalDrive, LocalIndexStore, LocalObjectStore, StaticIdentity};
