use std::sync::Arc;

use axum::{Json, response::IntoResponse};
use serde::Serialize;
use tracing::info;

use crate::bookmarks::ResourceService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ResourceService>,
    pub api_token: Arc<str>,
}

impl AppState {
    pub fn new(service: ResourceService, api_token: &str) -> Self {
        AppState {
            service: Arc::new(service),
            api_token: Arc::from(api_token),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(HealthResponse { status: "ok" })
}
