use rusqlite::Connection;
use tracing::info;

use crate::StoreError;

/// Create the schema if it does not exist yet. Safe to run on every open.
pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            bio         TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY,
            sender      TEXT NOT NULL,
            receiver    TEXT NOT NULL,
            text        TEXT NOT NULL,
            timestamp   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_receiver
            ON messages(receiver, timestamp);
        ",
    )?;

    info!("Database schema ready");
    Ok(())
}
