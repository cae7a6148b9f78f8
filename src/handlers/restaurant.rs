use std::sync::Arc;

use crate::restaurant::{self, NewRestaurant, RestaurantStore, UpdateRestaurant};
use crate::web::{decode, Context, HandlerResult, JsonResponse, Params, Request};

pub struct Restaurants {
    db: Arc<dyn RestaurantStore>,
}

impl Restaurants {
    pub fn new(db: Arc<dyn RestaurantStore>) -> Self {
        Self { db }
    }

    pub async fn list(&self, ctx: &mut Context, _req: Request, _params: Params) -> HandlerResult {
        let restaurants = restaurant::list(self.db.as_ref(), ctx.deadline()).await?;
        JsonResponse::ok(restaurants).into_result()
    }

    pub async fn create(&self, ctx: &mut Context, req: Request, _params: Params) -> HandlerResult {
        let claims = ctx.claims()?;
        let new: NewRestaurant = decode(req).await?;

        let created = restaurant::create(self.db.as_ref(), claims, new, ctx.now(), ctx.deadline()).await?;
        JsonResponse::created(created).into_result()
    }

    pub async fn retrieve(&self, ctx: &mut Context, _req: Request, params: Params) -> HandlerResult {
        let id = params.get("id").unwrap_or_default();
        let found = restaurant::retrieve(self.db.as_ref(), id, ctx.deadline()).await?;
        JsonResponse::ok(found).into_result()
    }

    pub async fn update(&self, ctx: &mut Context, req: Request, params: Params) -> HandlerResult {
        let claims = ctx.claims()?;
        let id = params.get("id").unwrap_or_default();
        restaurant::parse_id(id)?;
        let update: UpdateRestaurant = decode(req).await?;

        restaurant::update(self.db.as_ref(), claims, id, update, ctx.now(), ctx.deadline()).await?;
        JsonResponse::no_content().into_result()
    }

    pub async fn delete(&self, ctx: &mut Context, _req: Request, params: Params) -> HandlerResult {
        let id = params.get("id").unwrap_or_default();
        restaurant::delete(self.db.as_ref(), id, ctx.deadline()).await?;
        JsonResponse::no_content().into_result()
    }
}
