use crate::error::{BookmarkError, BookmarkResult};
use crate::model::{Bookmark, UpdateBookmark, UpdatePatch};

use super::validator::{parse_rating, validate_update};

/// Turns a partial update request into a patch that only touches the named fields.
///
/// A field counts as present when its key was sent with a non-null value, so a
/// rating of `0` or an empty description are real assignments.
pub fn resolve_patch(existing: &Bookmark, input: UpdateBookmark) -> BookmarkResult<UpdatePatch> {
    if input.title.is_none()
        && input.url.is_none()
        && input.description.is_none()
        && input.rating.is_none()
    {
        tracing::error!(id = existing.id, "update request names no updatable field");
        return Err(BookmarkError::EmptyUpdate);
    }

    validate_update(&input)?;

    let rating = input.rating.as_ref().map(parse_rating).transpose()?;
    let patch = UpdatePatch {
        title: input.title,
        url: input.url,
        description: input.description,
        rating,
    };

    tracing::debug!(id = existing.id, fields = ?patch.field_names(), "resolved bookmark patch");
    Ok(patch)
}
