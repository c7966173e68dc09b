use async_trait::async_trait;

use super::CompletedFile;
use crate::error::CatalogError;

/// 已完成文件目录，按显示名寻址
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list(&self) -> Result<Vec<CompletedFile>, CatalogError>;

    async fn get(&self, id: &str) -> Result<Option<CompletedFile>, CatalogError>;

    /// Insert `file`, replacing an entry with the same `name`. The replaced
    /// entry's artifact is deleted when its path differs from the new one.
    async fn upsert_by_name(&self, file: CompletedFile) -> Result<(), CatalogError>;

    /// Remove entries and their artifacts; returns how many were removed.
    async fn remove_many(&self, ids: &[String]) -> Result<usize, CatalogError>;
}
