//! Table definitions and the development seed.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::time::Instant;
use tracing::info;
use uuid::{uuid, Uuid};

use crate::auth::{ROLE_ADMIN, ROLE_USER};
use crate::restaurant::{Menu, MenuStore, Restaurant, RestaurantStore};
use crate::user::{self, User, UserStore, UserError};

const MIGRATIONS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        user_id       UUID PRIMARY KEY,
        name          TEXT NOT NULL,
        email         TEXT NOT NULL UNIQUE,
        roles         TEXT[] NOT NULL,
        password_hash TEXT NOT NULL,
        date_created  TIMESTAMPTZ NOT NULL,
        date_updated  TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS restaurant (
        restaurant_id UUID PRIMARY KEY,
        name          TEXT NOT NULL,
        address       TEXT NOT NULL,
        owner_user_id TEXT NOT NULL,
        date_created  TIMESTAMPTZ NOT NULL,
        date_updated  TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS menu (
        menu_id       UUID PRIMARY KEY,
        restaurant_id UUID NOT NULL REFERENCES restaurant (restaurant_id) ON DELETE CASCADE,
        date          TIMESTAMPTZ NOT NULL,
        menu          TEXT NOT NULL,
        votes         BIGINT NOT NULL DEFAULT 0
    )"#,
];

/// Create any missing tables in a single transaction.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in MIGRATIONS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!(tables = MIGRATIONS.len(), "schema migrated");
    Ok(())
}

pub const SEED_PASSWORD: &str = "gophers";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "user@example.com";
pub const ADMIN_ID: Uuid = uuid!("5cf37266-3473-4006-984f-9325122678b7");
pub const USER_ID: Uuid = uuid!("45b5fbd3-755f-4379-8f07-a58d4a30fa2f");
pub const RESTAURANT_ID: Uuid = uuid!("9b468f90-1cf1-4377-b3fa-68b450d632a0");
pub const MENU_ID: Uuid = uuid!("72f8b983-3eb4-48db-9ed0-e45cc6bd716b");

/// Insert the development users, a restaurant and its menu. Rows that
/// already exist are left untouched.
pub async fn seed<S>(store: &S, now: DateTime<Utc>, deadline: Instant) -> Result<(), UserError>
where
    S: UserStore + RestaurantStore + MenuStore,
{
    let users = [
        (ADMIN_ID, "Admin Gopher", ADMIN_EMAIL, vec![ROLE_ADMIN, ROLE_USER]),
        (USER_ID, "User Gopher", USER_EMAIL, vec![ROLE_USER]),
    ];

    for (id, name, email, roles) in users {
        if store.fetch_user_by_email(email, deadline).await?.is_some() {
            continue;
        }

        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            roles: roles.into_iter().map(String::from).collect(),
            password_hash: user::hash_password(SEED_PASSWORD.to_string()).await?,
            date_created: now,
            date_updated: now,
        };
        store.insert_user(&user, deadline).await?;
    }

    if store.fetch_restaurant(RESTAURANT_ID, deadline).await?.is_none() {
        let restaurant = Restaurant {
            id: RESTAURANT_ID,
            name: "Gopher Diner".to_string(),
            address: "Gedimino pr. 9, Vilnius".to_string(),
            owner_user_id: ADMIN_ID.to_string(),
            date_created: now,
            date_updated: now,
        };
        store.insert_restaurant(&restaurant, deadline).await?;

        let menu = Menu {
            id: MENU_ID,
            restaurant_id: RESTAURANT_ID,
            date: now,
            menu: "Beet soup, potato pancakes".to_string(),
            votes: 0,
        };
        store.insert_menu(&menu, deadline).await?;
    }

    info!("seed data present");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use std::time::Duration;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();
        let deadline = Instant::now() + Duration::from_secs(30);

        seed(&store, Utc::now(), deadline).await.unwrap();
        seed(&store, Utc::now(), deadline).await.unwrap();

        assert_eq!(store.list_users(deadline).await.unwrap().len(), 2);
        assert_eq!(store.list_restaurants(deadline).await.unwrap().len(), 1);
        let menu = store.latest_menu(RESTAURANT_ID, deadline).await.unwrap().unwrap();
        assert_eq!(menu.id, MENU_ID);
    }
}
