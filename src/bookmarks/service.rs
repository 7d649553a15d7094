use std::sync::Arc;

use crate::error::{BookmarkError, BookmarkResult};
use crate::model::{Bookmark, CreateBookmark, UpdateBookmark};

use super::resolver::resolve_patch;
use super::sanitizer::sanitize_bookmark;
use super::store::BookmarkStore;
use super::validator::validate_create;

/// A freshly created bookmark together with the path it can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub bookmark: Bookmark,
    pub location: String,
}

pub fn location_for(id: i64) -> String {
    format!("/bookmarks/{}", id)
}

/// Runs validation, sanitization and patch resolution in front of a [`BookmarkStore`].
pub struct ResourceService {
    store: Arc<dyn BookmarkStore>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn BookmarkStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> BookmarkResult<Vec<Bookmark>> {
        let bookmarks = self.store.list_all().await?;
        tracing::info!(count = bookmarks.len(), "listed bookmarks");
        Ok(bookmarks.into_iter().map(sanitize_bookmark).collect())
    }

    pub async fn get(&self, id: i64) -> BookmarkResult<Bookmark> {
        self.lookup(id).await.map(sanitize_bookmark)
    }

    pub async fn create(&self, input: CreateBookmark) -> BookmarkResult<Created> {
        let draft = validate_create(input).inspect_err(|e| {
            tracing::error!(reason = ?e, "{}", e);
        })?;

        let bookmark = self.store.insert(draft).await?;
        tracing::info!("Bookmark with id {} created.", bookmark.id);

        Ok(Created {
            location: location_for(bookmark.id),
            bookmark: sanitize_bookmark(bookmark),
        })
    }

    /// Deletes after an existence check; the affected row count is not re-checked.
    pub async fn delete(&self, id: i64) -> BookmarkResult<()> {
        self.lookup(id).await?;
        let affected = self.store.delete(id).await?;
        tracing::info!(affected, "Bookmark with id {} deleted.", id);
        Ok(())
    }

    pub async fn update(&self, id: i64, input: UpdateBookmark) -> BookmarkResult<()> {
        let existing = self.lookup(id).await?;
        let patch = resolve_patch(&existing, input).inspect_err(|e| {
            tracing::error!(id, reason = ?e, "{}", e);
        })?;

        let affected = self.store.patch(id, &patch).await?;
        tracing::info!(affected, fields = ?patch.field_names(), "Bookmark with id {} updated.", id);
        Ok(())
    }

    async fn lookup(&self, id: i64) -> BookmarkResult<Bookmark> {
        match self.store.get_by_id(id).await? {
            Some(bookmark) => Ok(bookmark),
            None => {
                tracing::error!("Bookmark with id {} not found.", id);
                Err(BookmarkError::NotFound(id))
            }
        }
    }
}
