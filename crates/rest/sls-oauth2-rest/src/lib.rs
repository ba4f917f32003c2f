//! axum binding for the OAuth2 login flow.
//!
//! Three endpoints over a shared [`LoginFlow`]:
//! `POST /auth/oauth2/authorize`, `GET /auth/oauth2/callback/{provider}`,
//! and `POST /auth/oauth2/token`. The callback always answers with a
//! redirect; the JSON endpoints answer structured failures as
//! `400 {"error": code}`.

mod types;

#[cfg(test)]
mod tests;

pub use types::{AuthorizeBody, AuthorizeResponse, CallbackQuery, ErrorBody, TokenBody,
    TokenResponseBody, UserBody};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Json;
use sls_identity_flow::{FlowError, LoginFlow};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
struct AppState {
    flow: Arc<LoginFlow>,
}

/// Build the login router over a configured flow.
pub fn router(flow: Arc<LoginFlow>) -> Router {
    Router::new()
        .route("/auth/oauth2/authorize", post(authorize))
        .route("/auth/oauth2/callback/{provider}", get(callback))
        .route("/auth/oauth2/token", post(exchange_token))
        .with_state(AppState { flow })
}

async fn authorize(
    State(state): State<AppState>,
    Json(body): Json<AuthorizeBody>,
) -> Response {
    match state.flow.authorize(body.into()).await {
        Ok(grant) => Json(AuthorizeResponse {
            authorization_url: grant.authorization_url,
            state: grant.state,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    debug!("OAuth2 callback arrived via /{} path", provider);

    // The provider path segment is informational; the values pinned at
    // authorize time drive the flow. The state record is consumed either way.
    let outcome = state.flow.callback(&query.code, &query.state).await;
    Redirect::to(outcome.redirect())
}

async fn exchange_token(
    State(state): State<AppState>,
    Json(body): Json<TokenBody>,
) -> Response {
    match state.flow.exchange_token(body.into()).await {
        Ok(grant) => Json(TokenResponseBody {
            user: (&grant.account).into(),
            token: grant.token,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(e: FlowError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: e.code().to_string(),
        }),
    )
        .into_response()
}
