//! Restaurants and their daily menus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::StoreError;
use crate::error::FieldError;
use crate::web::{Validate, Violations};

pub mod menu;
mod store;

pub use menu::{Menu, NewMenu, Votes};
pub use store::{MenuStore, RestaurantStore};

#[derive(Debug, thiserror::Error)]
pub enum RestaurantError {
    #[error("ID is not in its proper form")]
    InvalidId,
    #[error("Restaurant not found")]
    NotFound,
    #[error("Menu not found")]
    MenuNotFound,
    #[error("Attempted action is not allowed")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Restaurant {
    #[sqlx(rename = "restaurant_id")]
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub owner_user_id: String,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

/// Body of a create request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRestaurant {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

impl Validate for NewRestaurant {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Violations::new()
            .required("name", &self.name)
            .required("address", &self.address)
            .finish()
    }
}

/// Body of an update request. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRestaurant {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl Validate for UpdateRestaurant {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Ok(())
    }
}

pub fn parse_id(id: &str) -> Result<Uuid, RestaurantError> {
    Uuid::parse_str(id).map_err(|_| RestaurantError::InvalidId)
}

pub async fn list(store: &dyn RestaurantStore, deadline: Instant) -> Result<Vec<Restaurant>, RestaurantError> {
    Ok(store.list_restaurants(deadline).await?)
}

/// Create a restaurant owned by the caller.
pub async fn create(
    store: &dyn RestaurantStore,
    claims: &Claims,
    new: NewRestaurant,
    now: DateTime<Utc>,
    deadline: Instant,
) -> Result<Restaurant, RestaurantError> {
    let restaurant = Restaurant {
        id: Uuid::new_v4(),
        name: new.name,
        address: new.address,
        owner_user_id: claims.sub.clone(),
        date_created: now,
        date_updated: now,
    };

    store.insert_restaurant(&restaurant, deadline).await?;
    Ok(restaurant)
}

pub async fn retrieve(store: &dyn RestaurantStore, id: &str, deadline: Instant) -> Result<Restaurant, RestaurantError> {
    let id = parse_id(id)?;
    store
        .fetch_restaurant(id, deadline)
        .await?
        .ok_or(RestaurantError::NotFound)
}

/// Apply `update`. Only admins and the owner may change a restaurant.
pub async fn update(
    store: &dyn RestaurantStore,
    claims: &Claims,
    id: &str,
    update: UpdateRestaurant,
    now: DateTime<Utc>,
    deadline: Instant,
) -> Result<(), RestaurantError> {
    let mut restaurant = retrieve(store, id, deadline).await?;

    if !claims.can_modify(&restaurant.owner_user_id) {
        return Err(RestaurantError::Forbidden);
    }

    if let Some(name) = update.name {
        restaurant.name = name;
    }
    if let Some(address) = update.address {
        restaurant.address = address;
    }
    restaurant.date_updated = now;

    store.update_restaurant(&restaurant, deadline).await?;
    Ok(())
}

/// Remove a restaurant. Deleting one that does not exist is not an error.
pub async fn delete(store: &dyn RestaurantStore, id: &str, deadline: Instant) -> Result<(), RestaurantError> {
    let id = parse_id(id)?;
    store.delete_restaurant(id, deadline).await?;
    Ok(())
}
