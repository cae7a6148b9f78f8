use async_trait::async_trait;
use tokio::time::Instant;

use super::User;
use crate::database::{bounded, PgStore, StoreError};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self, deadline: Instant) -> Result<Vec<User>, StoreError>;
    async fn fetch_user_by_email(&self, email: &str, deadline: Instant) -> Result<Option<User>, StoreError>;
    async fn insert_user(&self, user: &User, deadline: Instant) -> Result<(), StoreError>;
}

const COLUMNS: &str = "user_id, name, email, roles, password_hash, date_created, date_updated";

#[async_trait]
impl UserStore for PgStore {
    async fn list_users(&self, deadline: Instant) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM users");
        let query = sqlx::query_as::<_, User>(&sql).fetch_all(self.pool());

        bounded(deadline, query).await
    }

    async fn fetch_user_by_email(&self, email: &str, deadline: Instant) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        let query = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool());

        bounded(deadline, query).await
    }

    async fn insert_user(&self, user: &User, deadline: Instant) -> Result<(), StoreError> {
        let sql = format!("INSERT INTO users ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)");
        let query = sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.roles)
            .bind(&user.password_hash)
            .bind(user.date_created)
            .bind(user.date_updated)
            .execute(self.pool());

        bounded(deadline, query).await?;
        Ok(())
    }
}
