//! Filesystem-backed collaborators used by the binary and integration tests.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::backend::{
    ArtifactBody, FileId, FolderId, HierarchyStore, IdentityProvider, IndexRecord, IndexStore,
    ObjectStore, RecordId, RetrievalRef, Uploader,
};

/// Join a `/`-separated relative key onto `root`, refusing anything that
/// would escape it.
fn join_relative(root: &Path, key: &str) -> Result<PathBuf> {
    let relative = Path::new(key);
    for component in relative.components() {
        match component {
            Component::Normal(_) => {}
            other => bail!("Illegal path component {:?} in '{}'", other, key),
        }
    }
    if key.is_empty() {
        bail!("Empty key");
    }
    Ok(root.join(relative))
}

fn check_segment(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        bail!("Illegal folder or file name '{}'", name);
    }
    Ok(())
}

async fn write_body(path: &Path, mut body: ArtifactBody) -> Result<u64> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let mut out = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create {:?}", path))?;
    let written = tokio::io::copy(&mut body.file, &mut out)
        .await
        .with_context(|| format!("Failed to write {:?}", path))?;
    out.flush().await?;

    if written != body.len {
        bail!(
            "Short write to {:?}: {} of {} bytes",
            path,
            written,
            body.len
        );
    }
    Ok(written)
}

/// Object store writing under `<root>/objects/<key>`
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into().join("objects"),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, body: ArtifactBody) -> Result<RetrievalRef> {
        let path = join_relative(&self.root, key)?;
        let content_type = body.content_type;
        let written = write_body(&path, body).await?;

        info!("Stored object {} ({} bytes, {})", key, written, content_type);
        Ok(RetrievalRef(format!("file://{}", path.display())))
    }
}

#[derive(Serialize)]
struct StoredRecord<'a> {
    id: &'a str,
    #[serde(flatten)]
    record: &'a IndexRecord,
}

/// Index store appending JSON lines to `<root>/index/<collection>.jsonl`
pub struct LocalIndexStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalIndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into().join("index"),
            write_lock: Mutex::new(()),
        }
    }

    pub fn collection_path(&self, collection: &str) -> Result<PathBuf> {
        check_segment(collection)?;
        Ok(self.root.join(format!("{}.jsonl", collection)))
    }
}

#[async_trait::async_trait]
impl IndexStore for LocalIndexStore {
    async fn insert_record(&self, collection: &str, record: &IndexRecord) -> Result<RecordId> {
        let path = self.collection_path(collection)?;
        let id = uuid::Uuid::new_v4().to_string();

        let mut line = serde_json::to_vec(&StoredRecord { id: &id, record })?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("Failed to create index directory")?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open {:?}", path))?;
        file.write_all(&line).await?;
        file.flush().await?;

        info!("Inserted {} record {}", collection, id);
        Ok(RecordId(id))
    }
}

/// Hierarchical store mapping folders to directories under `<root>/drive`
///
/// Folder ids are `/`-separated paths relative to the drive root.
pub struct LocalDrive {
    root: PathBuf,
}

impl LocalDrive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into().join("drive"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn child_id(parent: Option<&FolderId>, name: &str) -> FolderId {
        match parent {
            Some(parent) => FolderId(format!("{}/{}", parent.0, name)),
            None => FolderId(name.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl HierarchyStore for LocalDrive {
    async fn find_folder(&self, name: &str, parent: Option<&FolderId>) -> Result<Option<FolderId>> {
        check_segment(name)?;
        let id = Self::child_id(parent, name);
        let path = join_relative(&self.root, &id.0)?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(Some(id)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to stat {:?}", path)),
        }
    }

    async fn create_folder(&self, name: &str, parent: Option<&FolderId>) -> Result<FolderId> {
        check_segment(name)?;
        let id = Self::child_id(parent, name);
        let path = join_relative(&self.root, &id.0)?;

        if let Some(parent) = path.parent() {
            if !tokio::fs::try_exists(parent).await.unwrap_or(false) && parent != self.root {
                bail!("Parent folder {:?} does not exist", parent);
            }
        }
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::create_dir(&path)
            .await
            .with_context(|| format!("Failed to create folder {:?}", path))?;

        debug!("Created folder {}", id);
        Ok(id)
    }

    async fn upload_file(&self, parent: &FolderId, name: &str, body: ArtifactBody) -> Result<FileId> {
        check_segment(name)?;
        let id = format!("{}/{}", parent.0, name);
        let path = join_relative(&self.root, &id)?;
        write_body(&path, body).await?;

        info!("Uploaded {} to drive", id);
        Ok(FileId(id))
    }
}

/// Identity fixed at construction
pub struct StaticIdentity {
    uploader: Option<Uploader>,
    hierarchy: Option<Arc<dyn HierarchyStore>>,
}

impl StaticIdentity {
    pub fn new(uploader: Option<Uploader>, hierarchy: Option<Arc<dyn HierarchyStore>>) -> Self {
        Self {
            uploader,
            hierarchy,
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_identity(&self) -> Option<Uploader> {
        self.uploader.clone()
    }

    async fn hierarchy_client(&self) -> Option<Arc<dyn HierarchyStore>> {
        self.hierarchy.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn body_from(dir: &Path, contents: &[u8]) -> ArtifactBody {
        let path = dir.join("artifact.m4a");
        tokio::fs::write(&path, contents).await.unwrap();
        ArtifactBody {
            file: tokio::fs::File::open(&path).await.unwrap(),
            len: contents.len() as u64,
            content_type: "audio/mp4",
        }
    }

    #[test]
    fn test_join_relative_rejects_escapes() {
        let root = Path::new("/tmp/root");
        assert!(join_relative(root, "audio/uid/file.m4a").is_ok());
        assert!(join_relative(root, "../etc/passwd").is_err());
        assert!(join_relative(root, "/abs").is_err());
        assert!(join_relative(root, "").is_err());
    }

    #[tokio::test]
    async fn test_object_store_writes_under_key() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let body = body_from(dir.path(), b"aac").await;

        let reference = store.put("audio/u1/a.m4a", body).await.unwrap();

        let stored = dir.path().join("objects/audio/u1/a.m4a");
        assert_eq!(tokio::fs::read(&stored).await.unwrap(), b"aac");
        assert!(reference.0.starts_with("file://"));
    }

    #[tokio::test]
    async fn test_drive_find_after_create() {
        let dir = TempDir::new().unwrap();
        let drive = LocalDrive::new(dir.path());

        assert_eq!(drive.find_folder("Study Buddy", None).await.unwrap(), None);
        let root = drive.create_folder("Study Buddy", None).await.unwrap();
        assert_eq!(
            drive.find_folder("Study Buddy", None).await.unwrap(),
            Some(root.clone())
        );

        let child = drive.create_folder("2024_Spring", Some(&root)).await.unwrap();
        assert_eq!(child.0, "Study Buddy/2024_Spring");
        assert!(drive.create_folder("../x", Some(&root)).await.is_err());
    }

    #[tokio::test]
    async fn test_index_store_appends_lines() {
        let dir = TempDir::new().unwrap();
        let index = LocalIndexStore::new(dir.path());
        let record = IndexRecord {
            user_id: "u1".to_string(),
            title: "Lecture 1/3/2024".to_string(),
            recorded_at: chrono::Local::now(),
            status: "uploaded".to_string(),
            download_url: "file:///x".to_string(),
        };

        let a = index.insert_record("lectures", &record).await.unwrap();
        let b = index.insert_record("lectures", &record).await.unwrap();
        assert_ne!(a, b);

        let contents = tokio::fs::read_to_string(index.collection_path("lectures").unwrap())
            .await
            .unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["userId"], "u1");
        assert_eq!(lines[0]["status"], "uploaded");
        assert_eq!(lines[1]["id"], b.0.as_str());
    }
}
