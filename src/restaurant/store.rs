use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use super::{Menu, Restaurant};
use crate::database::{bounded, PgStore, StoreError};

#[async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn list_restaurants(&self, deadline: Instant) -> Result<Vec<Restaurant>, StoreError>;
    async fn fetch_restaurant(&self, id: Uuid, deadline: Instant) -> Result<Option<Restaurant>, StoreError>;
    async fn insert_restaurant(&self, restaurant: &Restaurant, deadline: Instant) -> Result<(), StoreError>;
    async fn update_restaurant(&self, restaurant: &Restaurant, deadline: Instant) -> Result<(), StoreError>;
    /// Removing an absent restaurant succeeds.
    async fn delete_restaurant(&self, id: Uuid, deadline: Instant) -> Result<(), StoreError>;
}

#[async_trait]
pub trait MenuStore: Send + Sync {
    async fn insert_menu(&self, menu: &Menu, deadline: Instant) -> Result<(), StoreError>;
    /// Newest menu of a restaurant by date.
    async fn latest_menu(&self, restaurant_id: Uuid, deadline: Instant) -> Result<Option<Menu>, StoreError>;
}

#[async_trait]
impl RestaurantStore for PgStore {
    async fn list_restaurants(&self, deadline: Instant) -> Result<Vec<Restaurant>, StoreError> {
        let query = sqlx::query_as::<_, Restaurant>(
            "SELECT restaurant_id, name, address, owner_user_id, date_created, date_updated FROM restaurant",
        )
        .fetch_all(self.pool());

        bounded(deadline, query).await
    }

    async fn fetch_restaurant(&self, id: Uuid, deadline: Instant) -> Result<Option<Restaurant>, StoreError> {
        let query = sqlx::query_as::<_, Restaurant>(
            "SELECT restaurant_id, name, address, owner_user_id, date_created, date_updated \
             FROM restaurant WHERE restaurant_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool());

        bounded(deadline, query).await
    }

    async fn insert_restaurant(&self, restaurant: &Restaurant, deadline: Instant) -> Result<(), StoreError> {
        let query = sqlx::query(
            "INSERT INTO restaurant (restaurant_id, name, address, owner_user_id, date_created, date_updated) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(restaurant.id)
        .bind(&restaurant.name)
        .bind(&restaurant.address)
        .bind(&restaurant.owner_user_id)
        .bind(restaurant.date_created)
        .bind(restaurant.date_updated)
        .execute(self.pool());

        bounded(deadline, query).await?;
        Ok(())
    }

    async fn update_restaurant(&self, restaurant: &Restaurant, deadline: Instant) -> Result<(), StoreError> {
        let query = sqlx::query(
            "UPDATE restaurant SET name = $2, address = $3, date_updated = $4 WHERE restaurant_id = $1",
        )
        .bind(restaurant.id)
        .bind(&restaurant.name)
        .bind(&restaurant.address)
        .bind(restaurant.date_updated)
        .execute(self.pool());

        bounded(deadline, query).await?;
        Ok(())
    }

    async fn delete_restaurant(&self, id: Uuid, deadline: Instant) -> Result<(), StoreError> {
        let query = sqlx::query("DELETE FROM restaurant WHERE restaurant_id = $1")
            .bind(id)
            .execute(self.pool());

        bounded(deadline, query).await?;
        Ok(())
    }
}

#[async_trait]
impl MenuStore for PgStore {
    async fn insert_menu(&self, menu: &Menu, deadline: Instant) -> Result<(), StoreError> {
        let query = sqlx::query(
            "INSERT INTO menu (menu_id, restaurant_id, date, menu, votes) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(menu.id)
        .bind(menu.restaurant_id)
        .bind(menu.date)
        .bind(&menu.menu)
        .bind(menu.votes)
        .execute(self.pool());

        bounded(deadline, query).await?;
        Ok(())
    }

    async fn latest_menu(&self, restaurant_id: Uuid, deadline: Instant) -> Result<Option<Menu>, StoreError> {
        let query = sqlx::query_as::<_, Menu>(
            "SELECT menu_id, restaurant_id, date, menu, votes FROM menu \
             WHERE restaurant_id = $1 ORDER BY date DESC LIMIT 1",
        )
        .bind(restaurant_id)
        .fetch_optional(self.pool());

        bounded(deadline, query).await
    }
}
