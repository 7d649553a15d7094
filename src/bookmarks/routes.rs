use axum::{
    Router,
    routing::get,
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/bookmarks",
            get(handler::list_bookmarks).post(handler::create_bookmark),
        )
        .route(
            "/bookmarks/:id",
            get(handler::get_bookmark)
                .delete(handler::delete_bookmark)
                .patch(handler::update_bookmark),
        )
}
