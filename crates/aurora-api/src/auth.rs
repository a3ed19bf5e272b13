use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::error;

use aurora_db::{Database, StoreError};
use aurora_gateway::relay::Relay;
use aurora_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub relay: Relay,
}

/// Create an account. The only defined failure is a taken username;
/// either way the response is a 200 with a success boolean.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Json<RegisterResponse> {
    // Run blocking DB work off the async runtime
    let db = state.db.clone();
    let result =
        tokio::task::spawn_blocking(move || db.create_user(&req.username, &req.password, &req.bio))
            .await;

    match result {
        Ok(Ok(())) => Json(RegisterResponse {
            success: true,
            message: None,
        }),
        Ok(Err(StoreError::DuplicateUsername)) => Json(RegisterResponse {
            success: false,
            message: Some("User exists".to_string()),
        }),
        Ok(Err(e)) => {
            error!("registration failed: {e}");
            Json(RegisterResponse {
                success: false,
                message: Some("internal error".to_string()),
            })
        }
        Err(e) => {
            error!("registration task failed: {e}");
            Json(RegisterResponse {
                success: false,
                message: Some("internal error".to_string()),
            })
        }
    }
}

/// Check a credential. The stored password is compared directly; a
/// wrong password and an unknown username produce the same response.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Json<LoginResponse> {
    let db = state.db.clone();
    let username = req.username.clone();
    let result = tokio::task::spawn_blocking(move || db.get_user(&username)).await;

    let user = match result {
        Ok(Ok(user)) => user,
        Ok(Err(e)) => {
            error!("login lookup failed: {e}");
            None
        }
        Err(e) => {
            error!("login task failed: {e}");
            None
        }
    };

    match user {
        Some(user) if user.password == req.password => Json(LoginResponse {
            success: true,
            username: Some(user.username),
            bio: Some(user.bio),
        }),
        _ => Json(LoginResponse::failure()),
    }
}
