/// Database row types — these map directly to SQLite rows.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub bio: String,
}

pub struct MessageRow {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub timestamp: String,
}
