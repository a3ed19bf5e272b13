use rusqlite::OptionalExtension;

use crate::models::{MessageRow, UserRow};
use crate::{Database, StoreError};

impl Database {
    // -- Users --

    /// Insert a new account. The first writer for a username wins; a
    /// UNIQUE violation on a later attempt maps to `DuplicateUsername`.
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        bio: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (username, password, bio) VALUES (?1, ?2, ?3)",
                (username, password, bio),
            ) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::DuplicateUsername)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, password, bio FROM users WHERE username = ?1",
                    [username],
                    |row| {
                        Ok(UserRow {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            password: row.get(2)?,
                            bio: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Substring search over usernames. ASCII case-insensitive (SQLite
    /// LIKE collation), ordered by insertion order.
    pub fn search_usernames(&self, query: &str) -> Result<Vec<String>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT username FROM users WHERE username LIKE ?1 ORDER BY id")?;
            let pattern = format!("%{}%", query);
            let rows = stmt
                .query_map([pattern], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    /// Append one chat line. The timestamp is assigned here, by the
    /// store, not by the caller.
    pub fn insert_message(
        &self,
        sender: &str,
        receiver: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (sender, receiver, text) VALUES (?1, ?2, ?3)",
                (sender, receiver, text),
            )?;
            Ok(())
        })
    }

    /// The conversation between two usernames, either direction, in
    /// insertion order.
    pub fn messages_between(
        &self,
        a: &str,
        b: &str,
        limit: u32,
    ) -> Result<Vec<MessageRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender, receiver, text, timestamp
                 FROM messages
                 WHERE (sender = ?1 AND receiver = ?2) OR (sender = ?2 AND receiver = ?1)
                 ORDER BY id
                 LIMIT ?3",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![a, b, limit], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        sender: row.get(1)?,
                        receiver: row.get(2)?,
                        text: row.get(3)?,
                        timestamp: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, StoreError};

    #[test]
    fn duplicate_username_first_writer_wins() {
        let db = Database::open_in_memory().unwrap();

        db.create_user("alice", "pw1", "first bio").unwrap();
        let err = db.create_user("alice", "pw2", "second bio").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));

        let user = db.get_user("alice").unwrap().unwrap();
        assert_eq!(user.password, "pw1");
        assert_eq!(user.bio, "first bio");
    }

    #[test]
    fn get_user_absent() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_user("nobody").unwrap().is_none());
    }

    #[test]
    fn search_is_substring_in_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "pw", "").unwrap();
        db.create_user("bob", "pw", "").unwrap();
        db.create_user("alicia", "pw", "").unwrap();

        assert_eq!(db.search_usernames("al").unwrap(), vec!["alice", "alicia"]);
        assert_eq!(db.search_usernames("bob").unwrap(), vec!["bob"]);
        assert!(db.search_usernames("zzz").unwrap().is_empty());
    }

    #[test]
    fn search_is_ascii_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "pw", "").unwrap();

        assert_eq!(db.search_usernames("AL").unwrap(), vec!["alice"]);
    }

    #[test]
    fn messages_round_trip_with_store_timestamps() {
        let db = Database::open_in_memory().unwrap();
        db.insert_message("alice", "bob", "hi").unwrap();
        db.insert_message("bob", "alice", "hey").unwrap();
        db.insert_message("alice", "carol", "other thread").unwrap();

        let convo = db.messages_between("alice", "bob", 50).unwrap();
        assert_eq!(convo.len(), 2);
        assert_eq!(convo[0].sender, "alice");
        assert_eq!(convo[0].receiver, "bob");
        assert_eq!(convo[0].text, "hi");
        assert_eq!(convo[1].sender, "bob");
        assert!(!convo[0].timestamp.is_empty());
        assert!(convo[0].timestamp <= convo[1].timestamp);
    }
}
