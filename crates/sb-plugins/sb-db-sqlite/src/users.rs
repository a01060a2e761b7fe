use async_trait::async_trait;
use sb_core::error::AppError;
use sb_core::models::User;
use sb_core::traits::UserRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::SqliteStore;

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
    }
}

#[async_trait]
impl UserRepo for SqliteStore {
    /// A taken username surfaces as [`AppError::Conflict`].
    async fn create_user(&self, username: &str, password_hash: &str) -> anyhow::Result<User> {
        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(User {
                id: done.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::Conflict(format!("username {username} already exists")).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn get_user(&self, id: i64) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, password_hash FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }
}
