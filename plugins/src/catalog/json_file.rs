//! 已完成文件目录：持久化为单个 JSON 数组文件

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use evalcmp_core::catalog::{Catalog, CompletedFile};
use evalcmp_core::error::CatalogError;
use tokio::sync::Mutex;

pub struct JsonFileCatalog {
    path: PathBuf,
    // serialises read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries whose files still exist, with sizes filled in. Rewrites the
    /// file when anything was pruned or filled.
    async fn load(&self) -> Result<Vec<CompletedFile>, CatalogError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let entries: Vec<CompletedFile> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    target: "evalcmp.catalog",
                    path = %self.path.display(),
                    error = %e,
                    "catalog file unreadable, starting empty"
                );
                return Ok(Vec::new());
            }
        };

        let before = entries.len();
        let mut dirty = false;
        let mut kept = Vec::with_capacity(before);
        for mut entry in entries {
            match tokio::fs::metadata(&entry.file_path).await {
                Ok(meta) => {
                    if entry.size.is_none() {
                        entry.size = Some(meta.len());
                        dirty = true;
                    }
                    kept.push(entry);
                }
                Err(_) => {
                    tracing::info!(
                        target: "evalcmp.catalog",
                        id = %entry.id,
                        path = %entry.file_path,
                        "dropping entry whose file is gone"
                    );
                    dirty = true;
                }
            }
        }
        if dirty {
            self.save(&kept).await?;
        }
        Ok(kept)
    }

    async fn save(&self, entries: &[CompletedFile]) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }
}

async fn remove_file_quietly(path: &str) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(target: "evalcmp.catalog", path = %path, error = %e, "failed to delete file"),
    }
}

#[async_trait]
impl Catalog for JsonFileCatalog {
    async fn list(&self) -> Result<Vec<CompletedFile>, CatalogError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn get(&self, id: &str) -> Result<Option<CompletedFile>, CatalogError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|f| f.id == id))
    }

    async fn upsert_by_name(&self, file: CompletedFile) -> Result<(), CatalogError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if let Some(pos) = entries.iter().position(|f| f.name == file.name) {
            let old = entries.remove(pos);
            if old.file_path != file.file_path {
                remove_file_quietly(&old.file_path).await;
            }
            tracing::info!(target: "evalcmp.catalog", name = %file.name, old_id = %old.id, "replacing catalog entry");
        }
        entries.push(file);
        self.save(&entries).await
    }

    async fn remove_many(&self, ids: &[String]) -> Result<usize, CatalogError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        let (gone, kept): (Vec<_>, Vec<_>) = entries.into_iter().partition(|f| ids.contains(&f.id));
        for f in &gone {
            remove_file_quietly(&f.file_path).await;
        }
        if !gone.is_empty() {
            self.save(&kept).await?;
        }
        Ok(gone.len())
    }
}
