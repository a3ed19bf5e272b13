use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use aurora_api::auth::{self, AppState, AppStateInner};
use aurora_api::users;
use aurora_db::Database;
use aurora_gateway::connection;
use aurora_gateway::registry::SessionRegistry;
use aurora_gateway::relay::Relay;

/// Build the full application router on top of an open database.
pub fn app(db: Arc<Database>) -> Router {
    let registry = SessionRegistry::new();
    let relay = Relay::new(registry, db.clone());
    let state: AppState = Arc::new(AppStateInner { db, relay });

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/search/{query}", get(users::search))
        .route("/ws/{username}", get(ws_upgrade))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn ws_upgrade(
    State(state): State<AppState>,
    Path(username): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let relay = state.relay.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, relay, username))
}
