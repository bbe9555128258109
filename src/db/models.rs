#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// bcrypt digest, never the plaintext.
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub post_id: i64,
    pub title: String,
    pub content: String,
    /// UTC, `YYYY-MM-DD HH:MM:SS`, assigned by the database on insert.
    pub creation_date: String,
    pub author_id: i64,
}
