//! HTTP handlers for the bookmarks API

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::{BookmarkError, BookmarkResult};
use crate::handler::AppState;
use crate::model::{Bookmark, CreateBookmark, UpdateBookmark};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> BookmarkResult<T> {
    match payload {
        Ok(Json(input)) => Ok(input),
        Err(rejection) => {
            tracing::error!(error = %rejection, "rejected request body");
            Err(BookmarkError::InvalidBody(rejection.body_text()))
        }
    }
}

fn bookmark_id(path: Result<Path<i64>, PathRejection>) -> BookmarkResult<i64> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            tracing::error!(error = %rejection, "rejected bookmark id");
            Err(BookmarkError::UnknownId(rejection.body_text()))
        }
    }
}

pub async fn list_bookmarks(State(state): State<AppState>) -> BookmarkResult<Json<Vec<Bookmark>>> {
    Ok(Json(state.service.list().await?))
}

pub async fn create_bookmark(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookmark>, JsonRejection>,
) -> BookmarkResult<Response> {
    let created = state.service.create(body(payload)?).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, created.location)],
        Json(created.bookmark),
    )
        .into_response())
}

pub async fn get_bookmark(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> BookmarkResult<Json<Bookmark>> {
    Ok(Json(state.service.get(bookmark_id(id)?).await?))
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> BookmarkResult<StatusCode> {
    state.service.delete(bookmark_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_bookmark(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateBookmark>, JsonRejection>,
) -> BookmarkResult<StatusCode> {
    let id = bookmark_id(id)?;
    state.service.update(id, body(payload)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
