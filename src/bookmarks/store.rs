use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Bookmark, BookmarkDraft, UpdatePatch};

/// Persistence seam for bookmark records.
///
/// Implementations return raw stored values; sanitization happens in the service.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// All records in ascending id order.
    async fn list_all(&self) -> Result<Vec<Bookmark>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Bookmark>>;

    /// Persists a draft and returns it with its assigned id.
    async fn insert(&self, draft: BookmarkDraft) -> Result<Bookmark>;

    /// Applies the fields set in `patch`, returning the number of affected rows.
    async fn patch(&self, id: i64, patch: &UpdatePatch) -> Result<u64>;

    async fn delete(&self, id: i64) -> Result<u64>;
}
