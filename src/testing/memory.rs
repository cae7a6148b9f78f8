use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::database::{StatusCheck, StoreError};
use crate::restaurant::{Menu, MenuStore, Restaurant, RestaurantStore};
use crate::user::{User, UserStore};

/// Store kept entirely in process memory. Deadlines are checked on entry so
/// handlers see the same `DeadlineExceeded` a slow database would give them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    restaurants: RwLock<HashMap<Uuid, Restaurant>>,
    menus: RwLock<Vec<Menu>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the status check fail, as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

fn check(deadline: Instant) -> Result<(), StoreError> {
    if Instant::now() >= deadline {
        return Err(StoreError::DeadlineExceeded);
    }
    Ok(())
}

#[async_trait]
impl StatusCheck for MemoryStore {
    async fn status_check(&self, deadline: Instant) -> Result<(), StoreError> {
        check(deadline)?;
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self, deadline: Instant) -> Result<Vec<User>, StoreError> {
        check(deadline)?;
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn fetch_user_by_email(&self, email: &str, deadline: Instant) -> Result<Option<User>, StoreError> {
        check(deadline)?;
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn insert_user(&self, user: &User, deadline: Instant) -> Result<(), StoreError> {
        check(deadline)?;
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl RestaurantStore for MemoryStore {
    async fn list_restaurants(&self, deadline: Instant) -> Result<Vec<Restaurant>, StoreError> {
        check(deadline)?;
        let mut restaurants: Vec<Restaurant> = self.restaurants.read().await.values().cloned().collect();
        restaurants.sort_by_key(|r| r.date_created);
        Ok(restaurants)
    }

    async fn fetch_restaurant(&self, id: Uuid, deadline: Instant) -> Result<Option<Restaurant>, StoreError> {
        check(deadline)?;
        Ok(self.restaurants.read().await.get(&id).cloned())
    }

    async fn insert_restaurant(&self, restaurant: &Restaurant, deadline: Instant) -> Result<(), StoreError> {
        check(deadline)?;
        self.restaurants.write().await.insert(restaurant.id, restaurant.clone());
        Ok(())
    }

    async fn update_restaurant(&self, restaurant: &Restaurant, deadline: Instant) -> Result<(), StoreError> {
        check(deadline)?;
        if let Some(existing) = self.restaurants.write().await.get_mut(&restaurant.id) {
            *existing = restaurant.clone();
        }
        Ok(())
    }

    async fn delete_restaurant(&self, id: Uuid, deadline: Instant) -> Result<(), StoreError> {
        check(deadline)?;
        self.restaurants.write().await.remove(&id);
        self.menus.write().await.retain(|menu| menu.restaurant_id != id);
        Ok(())
    }
}

#[async_trait]
impl MenuStore for MemoryStore {
    async fn insert_menu(&self, menu: &Menu, deadline: Instant) -> Result<(), StoreError> {
        check(deadline)?;
        self.menus.write().await.push(menu.clone());
        Ok(())
    }

    async fn latest_menu(&self, restaurant_id: Uuid, deadline: Instant) -> Result<Option<Menu>, StoreError> {
        check(deadline)?;
        let menus = self.menus.read().await;
        Ok(menus
            .iter()
            .filter(|menu| menu.restaurant_id == restaurant_id)
            .max_by_key(|menu| menu.date)
            .cloned())
    }
}
