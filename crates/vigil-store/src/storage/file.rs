//! JSON file-backed moderation storage

use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use vigil_common::{ContentId, ContentItem, ModerationError, Report, ReportId, Result, Visibility};

use crate::storage::memory::Tables;
use crate::storage::{ItemCommit, ModerationStore};

/// JSON snapshot-backed storage
///
/// Every operation re-reads the snapshot under an advisory lock on a sidecar
/// `<path>.lock` file: shared for reads, exclusive for writes. A write loads
/// the current snapshot, applies the change to it and renames a fresh
/// snapshot into place before releasing the lock, so several handles on one
/// path (in one process or many) never overwrite each other's commits, and
/// the version check in [`ModerationStore::apply`] sees every earlier write.
///
/// Suited to the CLI and small single-node deployments; larger installations
/// should implement [`ModerationStore`] over a database.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

impl FileStore {
    /// Open the snapshot at `path`, starting empty if the file does not exist
    ///
    /// Creates missing parent directories. Fails with a serialization error
    /// if an existing snapshot cannot be parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let store = Self {
            lock_path: sidecar(&path, ".lock"),
            path,
        };

        let (_items, _reports) = store.read_with(|tables| tables.len()).await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            path = %store.path.display(),
            items = _items,
            reports = _reports,
            "opened file store"
        );

        Ok(store)
    }

    /// Get the path to the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| {
                ModerationError::io(e)
                    .with_context(format!("opening lock {}", self.lock_path.display()))
            })
    }

    fn load(&self) -> Result<Tables> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                let mut tables: Tables = serde_json::from_slice(&bytes).map_err(|e| {
                    ModerationError::serialization(e)
                        .with_context(format!("reading {}", self.path.display()))
                })?;
                tables.reindex();
                Ok(tables)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Tables::default()),
            Err(e) => Err(ModerationError::io(e)),
        }
    }

    fn persist(&self, tables: &Tables) -> Result<()> {
        let json = serde_json::to_vec_pretty(tables)?;
        let staging = sidecar(&self.path, ".tmp");
        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    async fn read_with<T>(&self, f: impl FnOnce(&Tables) -> T + Send + 'static) -> Result<T>
    where
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || -> Result<T> {
            let lock = store.lock_file()?;
            FileExt::lock_shared(&lock)?;
            let tables = store.load()?;
            drop(lock);
            Ok(f(&tables))
        })
        .await
        .map_err(ModerationError::storage)?
    }

    async fn write_with<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T> + Send + 'static,
    ) -> Result<T>
    where
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || -> Result<T> {
            let lock = store.lock_file()?;
            FileExt::lock_exclusive(&lock)?;
            let mut tables = store.load()?;
            let out = f(&mut tables)?;
            store.persist(&tables)?;
            drop(lock);
            Ok(out)
        })
        .await
        .map_err(ModerationError::storage)?
    }
}

impl ModerationStore for FileStore {
    async fn content(&self, id: &ContentId) -> Result<Option<ContentItem>> {
        let id = id.clone();
        self.read_with(move |tables| tables.content(&id)).await
    }

    async fn insert_content(&self, item: ContentItem) -> Result<()> {
        self.write_with(|tables| tables.insert_content(item)).await
    }

    async fn content_in(&self, states: &[Visibility]) -> Result<Vec<ContentItem>> {
        let states = states.to_vec();
        self.read_with(move |tables| tables.content_in(&states)).await
    }

    async fn report(&self, id: &ReportId) -> Result<Option<Report>> {
        let id = id.clone();
        self.read_with(move |tables| tables.report(&id)).await
    }

    async fn reports_for(&self, content: &ContentId) -> Result<Vec<Report>> {
        let content = content.clone();
        self.read_with(move |tables| tables.reports_for(&content)).await
    }

    async fn apply(&self, commit: ItemCommit) -> Result<ContentItem> {
        self.write_with(|tables| tables.apply(commit)).await
    }
}
