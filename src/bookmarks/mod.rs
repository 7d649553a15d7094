//! Bookmarks Module
//!
//! Validation, sanitization and partial-update resolution for bookmark records,
//! plus the HTTP handlers and routes that expose them.
//!
//! # Pipeline
//!
//! - [`validate_create`] / [`validate_update`] gate every write
//! - [`resolve_patch`] turns a partial update into an [`UpdatePatch`](crate::model::UpdatePatch)
//! - [`sanitize`] runs on every title and description handed back to a caller
//! - [`ResourceService`] wires the above to a [`BookmarkStore`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use bookmarkd::bookmarks;
//!
//! let service = bookmarks::ResourceService::new(Arc::new(database));
//! let app = Router::new()
//!     .merge(bookmarks::routes())
//!     .with_state(AppState::new(service, token));
//! ```

mod handler;
mod resolver;
mod routes;
mod sanitizer;
mod service;
mod store;
mod validator;

pub use resolver::resolve_patch;
pub use routes::routes;
pub use sanitizer::{sanitize, sanitize_bookmark};
pub use service::{Created, ResourceService, location_for};
pub use store::BookmarkStore;
pub use validator::{MAX_RATING, MIN_RATING, parse_rating, validate_create, validate_update, validate_url};
