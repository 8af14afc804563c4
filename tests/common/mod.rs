// Shared in-memory collaborators for integration tests
//
// Every fake appends to a shared event log so tests can assert call order,
// and exposes knobs for fault injection.

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use study_buddy::storage::{
    ArtifactBody, FileId, FolderId, HierarchyStore, IdentityProvider, IndexRecord, IndexStore,
    ObjectStore, RecordId, RetrievalRef, Uploader,
};
use study_buddy::{
    CaptureConfig, CaptureDevice, CaptureHandle, CapturedAudio, Clock, OrchestratorConfig,
    UploadOrchestrator,
};
use tokio::io::AsyncReadExt;
use tokio::sync::Notify;

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

async fn read_body(mut body: ArtifactBody) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    body.file.read_to_end(&mut bytes).await?;
    Ok(bytes)
}

// ============================================================================
// Capture device
// ============================================================================

pub struct FakeDevice {
    pub dir: PathBuf,
    pub permission: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_stop: AtomicBool,
    pub log: EventLog,
    counter: AtomicUsize,
}

impl FakeDevice {
    pub fn new(dir: &Path, log: EventLog) -> Self {
        Self {
            dir: dir.to_path_buf(),
            permission: AtomicBool::new(true),
            fail_start: AtomicBool::new(false),
            fail_stop: AtomicBool::new(false),
            log,
            counter: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl CaptureDevice for FakeDevice {
    async fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    async fn start(&self, config: &CaptureConfig) -> Result<CaptureHandle> {
        if self.fail_start.load(Ordering::SeqCst) {
            bail!("microphone busy");
        }
        self.log.push(format!("device.start {}Hz", config.sample_rate));
        Ok(CaptureHandle::new())
    }

    async fn pause(&self, _handle: CaptureHandle) -> Result<()> {
        self.log.push("device.pause");
        Ok(())
    }

    async fn resume(&self, _handle: CaptureHandle) -> Result<()> {
        self.log.push("device.resume");
        Ok(())
    }

    async fn stop(&self, _handle: CaptureHandle) -> Result<CapturedAudio> {
        if self.fail_stop.load(Ordering::SeqCst) {
            bail!("flush failed");
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let path = self.dir.join(format!("recording_{}.m4a", n));
        tokio::fs::write(&path, b"fake aac payload").await?;
        self.log.push("device.stop");
        Ok(CapturedAudio {
            path,
            duration: Duration::ZERO,
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Object store
// ============================================================================

#[derive(Default)]
pub struct MemObjectStore {
    pub log: EventLog,
    pub fail: AtomicBool,
    /// When set, `put` waits for a notification before completing
    pub gate: Option<Arc<Notify>>,
    /// When set, `put` never completes
    pub hang: AtomicBool,
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemObjectStore {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemObjectStore {
    async fn put(&self, key: &str, body: ArtifactBody) -> Result<RetrievalRef> {
        self.log.push(format!("object.put {}", key));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            bail!("object store unavailable");
        }
        let bytes = read_body(body).await?;
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(RetrievalRef(format!("mem://{}", key)))
    }
}

// ============================================================================
// Index store
// ============================================================================

#[derive(Default)]
pub struct MemIndexStore {
    pub log: EventLog,
    pub fail: AtomicBool,
    pub records: Mutex<Vec<(String, IndexRecord)>>,
}

impl MemIndexStore {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl IndexStore for MemIndexStore {
    async fn insert_record(&self, collection: &str, record: &IndexRecord) -> Result<RecordId> {
        self.log.push(format!("index.insert {}", collection));
        if self.fail.load(Ordering::SeqCst) {
            bail!("index write rejected");
        }
        let mut records = self.records.lock().unwrap();
        records.push((collection.to_string(), record.clone()));
        Ok(RecordId(format!("rec-{}", records.len())))
    }
}

// ============================================================================
// Hierarchical store
// ============================================================================

#[derive(Debug, Clone)]
pub struct MemFolder {
    pub id: FolderId,
    pub name: String,
    pub parent: Option<FolderId>,
}

#[derive(Default)]
pub struct MemDrive {
    pub log: EventLog,
    pub folders: Mutex<Vec<MemFolder>>,
    pub files: Mutex<Vec<(FolderId, String, Vec<u8>)>>,
    /// Creating a folder with this name fails
    pub fail_create: Mutex<Option<String>>,
    pub fail_find: AtomicBool,
    pub fail_upload: AtomicBool,
    next_id: AtomicUsize,
}

impl MemDrive {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn creates(&self) -> usize {
        self.log.count("drive.create")
    }

    pub fn finds(&self) -> usize {
        self.log.count("drive.find")
    }

    /// Folder names from the root down to `id`
    pub fn path_of(&self, id: &FolderId) -> Vec<String> {
        let folders = self.folders.lock().unwrap();
        let mut names = Vec::new();
        let mut current = Some(id.clone());
        while let Some(cur) = current {
            match folders.iter().find(|f| f.id == cur) {
                Some(f) => {
                    names.push(f.name.clone());
                    current = f.parent.clone();
                }
                None => break,
            }
        }
        names.reverse();
        names
    }
}

#[async_trait::async_trait]
impl HierarchyStore for MemDrive {
    async fn find_folder(&self, name: &str, parent: Option<&FolderId>) -> Result<Option<FolderId>> {
        self.log.push(format!("drive.find {}", name));
        if self.fail_find.load(Ordering::SeqCst) {
            bail!("drive query failed");
        }
        let folders = self.folders.lock().unwrap();
        Ok(folders
            .iter()
            .find(|f| f.name == name && f.parent.as_ref() == parent)
            .map(|f| f.id.clone()))
    }

    async fn create_folder(&self, name: &str, parent: Option<&FolderId>) -> Result<FolderId> {
        self.log.push(format!("drive.create {}", name));
        if self.fail_create.lock().unwrap().as_deref() == Some(name) {
            return Err(anyhow!("quota exceeded creating {}", name));
        }
        let id = FolderId(format!("f{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.folders.lock().unwrap().push(MemFolder {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.cloned(),
        });
        Ok(id)
    }

    async fn upload_file(&self, parent: &FolderId, name: &str, body: ArtifactBody) -> Result<FileId> {
        self.log.push(format!("drive.upload {}", name));
        if self.fail_upload.load(Ordering::SeqCst) {
            bail!("drive upload failed");
        }
        let bytes = read_body(body).await?;
        let mut files = self.files.lock().unwrap();
        files.push((parent.clone(), name.to_string(), bytes));
        Ok(FileId(format!("file-{}", files.len())))
    }
}

// ============================================================================
// Identity
// ============================================================================

pub struct FakeIdentity {
    pub uploader: Option<Uploader>,
    pub drive: Option<Arc<MemDrive>>,
}

#[async_trait::async_trait]
impl IdentityProvider for FakeIdentity {
    async fn current_identity(&self) -> Option<Uploader> {
        self.uploader.clone()
    }

    async fn hierarchy_client(&self) -> Option<Arc<dyn HierarchyStore>> {
        self.drive
            .clone()
            .map(|d| d as Arc<dyn HierarchyStore>)
    }
}

pub fn student() -> Uploader {
    Uploader {
        uid: "uid-42".to_string(),
        display_name: Some("Ada".to_string()),
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub struct Backends {
    pub log: EventLog,
    pub objects: Arc<MemObjectStore>,
    pub index: Arc<MemIndexStore>,
    pub drive: Arc<MemDrive>,
}

impl Backends {
    pub fn new() -> Self {
        Self::with_objects(|log| MemObjectStore::new(log))
    }

    pub fn with_objects(make: impl FnOnce(EventLog) -> MemObjectStore) -> Self {
        let log = EventLog::default();
        Self {
            objects: Arc::new(make(log.clone())),
            index: Arc::new(MemIndexStore::new(log.clone())),
            drive: Arc::new(MemDrive::new(log.clone())),
            log,
        }
    }

    pub fn orchestrator(&self, uploader: Option<Uploader>, with_drive: bool) -> UploadOrchestrator {
        self.orchestrator_with(uploader, with_drive, OrchestratorConfig::default())
    }

    pub fn orchestrator_with(
        &self,
        uploader: Option<Uploader>,
        with_drive: bool,
        config: OrchestratorConfig,
    ) -> UploadOrchestrator {
        let identity = FakeIdentity {
            uploader,
            drive: with_drive.then(|| Arc::clone(&self.drive)),
        };
        UploadOrchestrator::new(
            Arc::clone(&self.objects) as Arc<dyn ObjectStore>,
            Arc::clone(&self.index) as Arc<dyn IndexStore>,
            Arc::new(identity),
            config,
        )
    }
}

pub fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> chrono::DateTime<chrono::Local> {
    use chrono::TimeZone;
    chrono::Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub fn arc_clock<C: Clock + 'static>(clock: &Arc<C>) -> Arc<dyn Clock> {
    Arc::clone(clock) as Arc<dyn Clock>
}
