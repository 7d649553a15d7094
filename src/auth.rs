use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::handler::AppState;

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
}

/// Rejects requests whose `Authorization: Bearer` token does not match the configured one.
pub async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match token {
        Some(token) if tokens_match(token, &state.api_token) => next.run(request).await,
        _ => {
            tracing::error!(path = %request.uri().path(), "Unauthorized request");
            unauthorized()
        }
    }
}

// Constant time over the token bytes once lengths agree. The length itself can leak.
fn tokens_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    if given.len() != expected.len() {
        return false;
    }
    given
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthErrorBody {
            error: "Unauthorized request",
        }),
    )
        .into_response()
}
