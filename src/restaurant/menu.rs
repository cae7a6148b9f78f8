use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use super::{parse_id, retrieve, MenuStore, RestaurantError, RestaurantStore};
use crate::auth::Claims;
use crate::error::FieldError;
use crate::web::{Validate, Violations};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Menu {
    #[sqlx(rename = "menu_id")]
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub date: DateTime<Utc>,
    pub menu: String,
    pub votes: i64,
}

/// Body of a menu create request. The restaurant comes from the path; a
/// body value, when present, has to agree with it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMenu {
    pub restaurant_id: Option<Uuid>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub menu: String,
}

impl Validate for NewMenu {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Violations::new().required("menu", &self.menu).finish()
    }
}

/// Vote tally of a restaurant's current menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Votes {
    pub restaurant_id: Uuid,
    pub menu_id: Uuid,
    pub date: DateTime<Utc>,
    pub votes: i64,
}

impl From<&Menu> for Votes {
    fn from(menu: &Menu) -> Self {
        Self {
            restaurant_id: menu.restaurant_id,
            menu_id: menu.id,
            date: menu.date,
            votes: menu.votes,
        }
    }
}

/// Publish a new menu for `restaurant_id`.
pub async fn create_menu(
    restaurants: &dyn RestaurantStore,
    menus: &dyn MenuStore,
    claims: &Claims,
    restaurant_id: &str,
    new: NewMenu,
    now: DateTime<Utc>,
    deadline: Instant,
) -> Result<Menu, RestaurantError> {
    let id = parse_id(restaurant_id)?;
    if new.restaurant_id.is_some_and(|body| body != id) {
        return Err(RestaurantError::InvalidId);
    }

    let restaurant = retrieve(restaurants, restaurant_id, deadline).await?;
    if !claims.can_modify(&restaurant.owner_user_id) {
        return Err(RestaurantError::Forbidden);
    }

    let menu = Menu {
        id: Uuid::new_v4(),
        restaurant_id: id,
        date: new.date.unwrap_or(now),
        menu: new.menu,
        votes: 0,
    };

    menus.insert_menu(&menu, deadline).await?;
    Ok(menu)
}

/// The most recent menu by date.
pub async fn current_menu(menus: &dyn MenuStore, restaurant_id: &str, deadline: Instant) -> Result<Menu, RestaurantError> {
    let id = parse_id(restaurant_id)?;
    menus
        .latest_menu(id, deadline)
        .await?
        .ok_or(RestaurantError::MenuNotFound)
}

pub async fn votes(menus: &dyn MenuStore, restaurant_id: &str, deadline: Instant) -> Result<Votes, RestaurantError> {
    let menu = current_menu(menus, restaurant_id, deadline).await?;
    Ok(Votes::from(&menu))
}
