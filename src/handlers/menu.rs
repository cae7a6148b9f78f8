use std::sync::Arc;

use crate::restaurant::{self, menu, MenuStore, NewMenu, RestaurantStore};
use crate::web::{decode, Context, HandlerResult, JsonResponse, Params, Request};

pub struct Menus {
    restaurants: Arc<dyn RestaurantStore>,
    menus: Arc<dyn MenuStore>,
}

impl Menus {
    pub fn new(restaurants: Arc<dyn RestaurantStore>, menus: Arc<dyn MenuStore>) -> Self {
        Self { restaurants, menus }
    }

    pub async fn create(&self, ctx: &mut Context, req: Request, params: Params) -> HandlerResult {
        let claims = ctx.claims()?;
        let restaurant_id = params.get("restaurantId").unwrap_or_default();
        restaurant::parse_id(restaurant_id)?;
        let new: NewMenu = decode(req).await?;

        let created = menu::create_menu(
            self.restaurants.as_ref(),
            self.menus.as_ref(),
            claims,
            restaurant_id,
            new,
            ctx.now(),
            ctx.deadline(),
        )
        .await?;

        JsonResponse::created(created).into_result()
    }

    pub async fn retrieve(&self, ctx: &mut Context, _req: Request, params: Params) -> HandlerResult {
        let restaurant_id = params.get("restaurantId").unwrap_or_default();
        let current = menu::current_menu(self.menus.as_ref(), restaurant_id, ctx.deadline()).await?;
        JsonResponse::ok(current).into_result()
    }

    pub async fn votes(&self, ctx: &mut Context, _req: Request, params: Params) -> HandlerResult {
        let restaurant_id = params.get("restaurantId").unwrap_or_default();
        let tally = menu::votes(self.menus.as_ref(), restaurant_id, ctx.deadline()).await?;
        JsonResponse::ok(tally).into_result()
    }
}
