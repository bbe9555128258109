// Repository pattern - every SQL statement the handlers need lives here
use async_trait::async_trait;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use std::sync::Arc;
use thiserror::Error;

use crate::db::models::{Post, User};
use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Conflict: {0}")]
    Conflict(String),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. A taken username yields `RepositoryError::Conflict`.
    async fn create_user(&self, username: &str, password_hash: &str)
        -> Result<User, RepositoryError>;

    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<User>, RepositoryError>;
}

/// Post access. Every single-row operation is scoped by `(post_id, author_id)`.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(
        &self,
        title: &str,
        content: &str,
        author_id: i64,
    ) -> Result<Post, RepositoryError>;

    /// Most recent first.
    async fn list_posts_by_author(&self, author_id: i64) -> Result<Vec<Post>, RepositoryError>;

    async fn find_post_by_id_and_author(
        &self,
        post_id: i64,
        author_id: i64,
    ) -> Result<Option<Post>, RepositoryError>;

    /// Returns the number of rows changed (0 or 1).
    async fn update_post(
        &self,
        post_id: i64,
        author_id: i64,
        title: &str,
        content: &str,
    ) -> Result<usize, RepositoryError>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete_post(&self, post_id: i64, author_id: i64) -> Result<usize, RepositoryError>;
}

/// SQLite implementation
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        post_id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        creation_date: row.get(3)?,
        author_id: row.get(4)?,
    })
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let conn = self.pool.get()?;

        let result = conn.query_row(
            r#"INSERT INTO "user" (username, password) VALUES (?1, ?2)
               RETURNING id, username, password"#,
            params![username, password_hash],
            user_from_row,
        );

        match result {
            Ok(user) => Ok(user),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(RepositoryError::Conflict(format!(
                    "username {} already exists",
                    username
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;

        let user = conn
            .query_row(
                r#"SELECT id, username, password FROM "user" WHERE username = ?1"#,
                params![username],
                user_from_row,
            )
            .optional()?;

        Ok(user)
    }
}

#[async_trait]
impl PostRepository for SqliteRepository {
    async fn create_post(
        &self,
        title: &str,
        content: &str,
        author_id: i64,
    ) -> Result<Post, RepositoryError> {
        let conn = self.pool.get()?;

        let post = conn.query_row(
            "INSERT INTO post (title, content, author_id) VALUES (?1, ?2, ?3)
             RETURNING post_id, title, content, creation_date, author_id",
            params![title, content, author_id],
            post_from_row,
        )?;

        Ok(post)
    }

    async fn list_posts_by_author(&self, author_id: i64) -> Result<Vec<Post>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT post_id, title, content, creation_date, author_id FROM post
             WHERE author_id = ?1
             ORDER BY post_id DESC",
        )?;
        let posts = stmt
            .query_map(params![author_id], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    async fn find_post_by_id_and_author(
        &self,
        post_id: i64,
        author_id: i64,
    ) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;

        let post = conn
            .query_row(
                "SELECT post_id, title, content, creation_date, author_id FROM post
                 WHERE post_id = ?1 AND author_id = ?2",
                params![post_id, author_id],
                post_from_row,
            )
            .optional()?;

        Ok(post)
    }

    async fn update_post(
        &self,
        post_id: i64,
        author_id: i64,
        title: &str,
        content: &str,
    ) -> Result<usize, RepositoryError> {
        let conn = self.pool.get()?;

        let rows = conn.execute(
            "UPDATE post SET title = ?1, content = ?2
             WHERE post_id = ?3 AND author_id = ?4",
            params![title, content, post_id, author_id],
        )?;

        Ok(rows)
    }

    async fn delete_post(&self, post_id: i64, author_id: i64) -> Result<usize, RepositoryError> {
        let conn = self.pool.get()?;

        let rows = conn.execute(
            "DELETE FROM post WHERE post_id = ?1 AND author_id = ?2",
            params![post_id, author_id],
        )?;

        Ok(rows)
    }
}

/// Type aliases for Arc-wrapped repositories
pub type DynUserRepository = Arc<dyn UserRepository>;
pub type DynPostRepository = Arc<dyn PostRepository>;
