use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::{Document, RankedResult};
use crate::store::{MemoryStore, UpsertReport, VectorStore};
use crate::{Error, Result};

/// On-disk layout of a [`FileStore`] snapshot
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    dimension: usize,
    records: Vec<Document>,
}

/// Durable document store.
///
/// Serves reads from an in-memory [`MemoryStore`] and rewrites a JSON
/// snapshot after every mutating call. The snapshot is written to a sibling
/// temp file and renamed over the old one, so a crash mid-write leaves the
/// previous snapshot intact.
///
/// Records applied in memory before a failed snapshot write are not rolled
/// back; the error is returned and the next successful write persists them.
pub struct FileStore {
    inner: MemoryStore,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, loading an existing snapshot if there is
    /// one. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>, dimension: usize) -> Result<Self> {
        let path = path.into();

        let inner = if path.exists() {
            let snapshot = read_snapshot(&path)?;
            if snapshot.dimension != dimension {
                return Err(Error::Config(format!(
                    "store {} holds {}-dimension vectors, configured dimension is {dimension}",
                    path.display(),
                    snapshot.dimension
                )));
            }
            info!(path = %path.display(), records = snapshot.records.len(), "loaded store snapshot");
            MemoryStore::with_documents(dimension, snapshot.records)?
        } else {
            debug!(path = %path.display(), "no snapshot yet, starting empty");
            MemoryStore::new(dimension)
        };

        Ok(Self {
            inner,
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the snapshot location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let _guard = self.write_lock.lock();

        let snapshot = Snapshot {
            dimension: self.inner.dimension(),
            records: self.inner.documents(),
        };
        write_snapshot(&self.path, &snapshot)?;

        debug!(path = %self.path.display(), records = snapshot.records.len(), "snapshot written");
        Ok(())
    }
}

impl VectorStore for FileStore {
    fn upsert(&self, documents: &[Document]) -> Result<UpsertReport> {
        let report = self.inner.upsert(documents)?;
        if report.inserted + report.replaced > 0 {
            self.persist()?;
        }
        Ok(report)
    }

    fn similarity_search(&self, query: &[f32], top_k: usize) -> Result<Vec<RankedResult>> {
        self.inner.similarity_search(query, top_k)
    }

    fn get(&self, identity: &str) -> Option<Document> {
        self.inner.get(identity)
    }

    fn sample(&self, n: usize) -> Vec<Document> {
        self.inner.sample(n)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn embedded_len(&self) -> usize {
        self.inner.embedded_len()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn clear(&self) -> Result<usize> {
        let removed = self.inner.clear()?;
        if removed > 0 || self.path.exists() {
            self.persist()?;
        }
        Ok(removed)
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Persistence(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| Error::Persistence(format!("corrupt snapshot {}: {e}", path.display())))
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let persistence = |e: std::io::Error| {
        Error::Persistence(format!("failed to write {}: {e}", path.display()))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persistence)?;
    }

    let bytes = serde_json::to_vec(snapshot)
        .map_err(|e| Error::Persistence(format!("failed to serialize snapshot: {e}")))?;

    let tmp = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp).map_err(persistence)?;
    file.write_all(&bytes).map_err(persistence)?;
    file.sync_all().map_err(persistence)?;
    drop(file);

    fs::rename(&tmp, path).map_err(persistence)
}
