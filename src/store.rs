//! Per-collection persistence of the travel progress fraction.
//!
//! The durable medium is a plain string-keyed, string-valued store. One key
//! per collection (`travel_progress:<collection key>`) holds the decimal
//! string of the last fraction. Reads never fail: a missing, unparsable or
//! implausible value is reported as absent. Writes never block the caller and
//! never surface errors.

use crate::collection::CollectionKey;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::JoinHandle;
use tracing::{debug, trace, warn};

pub const PROGRESS_KEY_PREFIX: &str = "travel_progress";
const PROGRESS_FILE: &str = "progress.toml";

/// Stored values are accepted within this distance outside `[0, 1]` and then
/// clamped; anything further out is treated as corrupt.
const SANE_TOLERANCE: f64 = 0.01;

/// String key/value medium backing the progress store.
pub trait KeyValueMedium: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Must return promptly; failures are the medium's to log.
    fn set(&self, key: &str, value: String);

    /// Block until previously accepted writes are durable.
    fn flush(&self) {}
}

#[derive(Clone)]
pub struct ProgressStore {
    medium: Arc<dyn KeyValueMedium>,
}

impl ProgressStore {
    pub fn new(medium: Arc<dyn KeyValueMedium>) -> Self {
        Self { medium }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryMedium::default()))
    }

    pub fn read(&self, collection: &CollectionKey) -> Option<f64> {
        let key = storage_key(collection);
        let raw = self.medium.get(&key)?;
        let parsed = parse_fraction(&raw);
        if parsed.is_none() {
            warn!(%key, value = %raw, "Ignoring corrupt persisted progress");
        }
        parsed
    }

    pub fn write(&self, collection: &CollectionKey, fraction: f64) {
        if !fraction.is_finite() {
            warn!(key = %collection, "Refusing to persist non-finite progress");
            return;
        }
        trace!(key = %collection, fraction, "Persisting progress");
        self.medium.set(&storage_key(collection), fraction.to_string());
    }

    pub fn flush(&self) {
        self.medium.flush();
    }
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore").finish_non_exhaustive()
    }
}

pub fn storage_key(collection: &CollectionKey) -> String {
    format!("{PROGRESS_KEY_PREFIX}:{collection}")
}

fn parse_fraction(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    if value < -SANE_TOLERANCE || value > 1.0 + SANE_TOLERANCE {
        return None;
    }
    Some(value.clamp(0.0, 1.0))
}

/// Process-local medium; the default for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryMedium {
    pub fn len(&self) -> usize {
        self.values.lock().map(|values| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueMedium for MemoryMedium {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ProgressEntry {
    key: String,
    value: String,
}

enum WriteRequest {
    Put { key: String, value: String },
    Flush(mpsc::Sender<()>),
}

/// Durable medium: one tiny TOML file per key.
///
/// Files live under `<root>/<sha256(key)>/progress.toml`. `set` lands in an
/// in-memory overlay immediately and is written to disk by a background
/// thread, so reads after a write see the new value even before it is flushed.
pub struct FileMedium {
    root: PathBuf,
    overlay: Mutex<HashMap<String, String>>,
    sender: Mutex<Option<mpsc::Sender<WriteRequest>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FileMedium {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let (tx, rx) = mpsc::channel::<WriteRequest>();
        let worker_root = root.clone();
        let worker = std::thread::Builder::new()
            .name("progress-writer".to_string())
            .spawn(move || run_writer(&worker_root, rx));
        let (sender, worker) = match worker {
            Ok(handle) => (Some(tx), Some(handle)),
            Err(err) => {
                warn!("Failed to start progress writer; progress will not be saved: {err}");
                (None, None)
            }
        };
        debug!(root = %root.display(), "Opened file progress medium");
        Self {
            root,
            overlay: Mutex::new(HashMap::new()),
            sender: Mutex::new(sender),
            worker: Mutex::new(worker),
        }
    }

    /// Stop the writer thread after draining pending writes.
    pub fn close(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Progress writer thread panicked");
            }
        }
    }

    fn send(&self, request: WriteRequest) -> bool {
        match self.sender.lock() {
            Ok(sender) => sender.as_ref().is_some_and(|tx| tx.send(request).is_ok()),
            Err(_) => false,
        }
    }
}

impl KeyValueMedium for FileMedium {
    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.overlay.lock().ok()?.get(key).cloned() {
            return Some(value);
        }
        read_entry(&self.root, key)
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut overlay) = self.overlay.lock() {
            overlay.insert(key.to_string(), value.clone());
        }
        if !self.send(WriteRequest::Put {
            key: key.to_string(),
            value,
        }) {
            debug!(%key, "Progress writer unavailable; keeping value in memory only");
        }
    }

    fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.send(WriteRequest::Flush(ack_tx)) {
            let _ = ack_rx.recv();
        }
    }
}

impl Drop for FileMedium {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_writer(root: &Path, rx: mpsc::Receiver<WriteRequest>) {
    while let Ok(first) = rx.recv() {
        // Only the newest value per key needs to reach disk.
        let mut pending: HashMap<String, String> = HashMap::new();
        let mut acks = Vec::new();
        for request in std::iter::once(first).chain(rx.try_iter()) {
            match request {
                WriteRequest::Put { key, value } => {
                    pending.insert(key, value);
                }
                WriteRequest::Flush(ack) => acks.push(ack),
            }
        }
        for (key, value) in pending {
            if let Err(err) = write_entry(root, &key, &value) {
                warn!(%key, "Failed to persist progress: {err:#}");
            }
        }
        for ack in acks {
            let _ = ack.send(());
        }
    }
    trace!("Progress writer stopped");
}

fn entry_path(root: &Path, key: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    root.join(hash).join(PROGRESS_FILE)
}

fn read_entry(root: &Path, key: &str) -> Option<String> {
    let data = fs::read_to_string(entry_path(root, key)).ok()?;
    let entry: ProgressEntry = toml::from_str(&data).ok()?;
    (entry.key == key).then_some(entry.value)
}

fn write_entry(root: &Path, key: &str, value: &str) -> Result<()> {
    let path = entry_path(root, key);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let entry = ProgressEntry {
        key: key.to_string(),
        value: value.to_string(),
    };
    let contents = toml::to_string(&entry).context("Failed to encode progress entry")?;
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("verse_flight_test_{name}_{nanos}"))
    }

    fn key(name: &str) -> CollectionKey {
        CollectionKey::new(name)
    }

    #[test]
    fn write_then_read_roundtrips_fraction() {
        let store = ProgressStore::in_memory();
        for fraction in [0.0, 0.1, 1.0 / 3.0, 0.5, 0.999_999_9, 1.0] {
            store.write(&key("Génesis/1"), fraction);
            assert_eq!(store.read(&key("Génesis/1")), Some(fraction));
        }
    }

    #[test]
    fn values_are_scoped_per_collection() {
        let store = ProgressStore::in_memory();
        store.write(&key("Génesis/1"), 0.25);
        assert_eq!(store.read(&key("Éxodo/1")), None);
        assert_eq!(store.read(&key("Génesis/1")), Some(0.25));
    }

    #[test]
    fn corrupt_values_read_as_absent() {
        let medium = Arc::new(MemoryMedium::default());
        let store = ProgressStore::new(medium.clone());
        let k = key("Juan/1");

        for raw in ["", "abc", "NaN", "inf", "-0.5", "1.5", "12"] {
            medium.set(&storage_key(&k), raw.to_string());
            assert_eq!(store.read(&k), None, "raw={raw:?}");
        }
    }

    #[test]
    fn slightly_out_of_range_values_are_clamped() {
        let medium = Arc::new(MemoryMedium::default());
        let store = ProgressStore::new(medium.clone());
        let k = key("Juan/1");

        medium.set(&storage_key(&k), "1.004".to_string());
        assert_eq!(store.read(&k), Some(1.0));
        medium.set(&storage_key(&k), " -0.002 ".to_string());
        assert_eq!(store.read(&k), Some(0.0));
    }

    #[test]
    fn non_finite_writes_are_dropped() {
        let medium = Arc::new(MemoryMedium::default());
        let store = ProgressStore::new(medium.clone());
        store.write(&key("Juan/1"), f64::NAN);
        assert!(medium.is_empty());
    }

    #[test]
    fn file_medium_persists_across_instances() {
        let root = unique_temp_dir("file_medium");
        let k = key("Salmos/23");
        {
            let store = ProgressStore::new(Arc::new(FileMedium::open(&root)));
            store.write(&k, 0.4);
            assert_eq!(store.read(&k), Some(0.4));
            store.flush();
        }

        let reopened = ProgressStore::new(Arc::new(FileMedium::open(&root)));
        assert_eq!(reopened.read(&k), Some(0.4));
        assert_eq!(reopened.read(&key("Salmos/24")), None);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn file_medium_keeps_only_latest_value() {
        let root = unique_temp_dir("file_medium_latest");
        let medium = FileMedium::open(&root);
        for i in 0..50 {
            medium.set("k", format!("{}", i as f64 / 100.0));
        }
        medium.close();

        let data = fs::read_to_string(entry_path(&root, "k")).expect("entry written");
        assert!(data.contains("0.49"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn file_medium_swallows_write_failures() {
        // A regular file where the cache directory should be.
        let root = unique_temp_dir("file_medium_blocked");
        fs::write(&root, "not a directory").expect("write blocker");
        let k = key("Rut/1");

        let store = ProgressStore::new(Arc::new(FileMedium::open(&root)));
        store.write(&k, 0.3);
        store.flush();

        assert_eq!(store.read(&k), Some(0.3));
        assert!(!entry_path(&root, &storage_key(&k)).exists());

        let _ = fs::remove_file(&root);
    }

    #[test]
    fn file_medium_ignores_garbage_files() {
        let root = unique_temp_dir("file_medium_garbage");
        let path = entry_path(&root, "k");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "not = [valid").expect("write garbage");

        let medium = FileMedium::open(&root);
        assert_eq!(medium.get("k"), None);

        let _ = fs::remove_dir_all(&root);
    }
}
