use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use aurora_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "aurora_server=debug,aurora_api=debug,aurora_gateway=debug,aurora_db=debug,tower_http=debug"
                    .into()
            }),
        )
        .init();

    // Config
    let db_path = std::env::var("AURORA_DB_PATH").unwrap_or_else(|_| "aurora.db".into());
    let host = std::env::var("AURORA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("AURORA_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;

    // Init database
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);

    let app = aurora_server::app(db);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Aurora server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
