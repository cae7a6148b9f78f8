use std::sync::Arc;

use chrono::Duration;

use crate::auth::Authenticator;
use crate::error::Error;
use crate::user::{self, NewUser, UserStore};
use crate::web::{basic_auth, decode, Context, HandlerResult, JsonResponse, Params, Request};

pub struct Users {
    db: Arc<dyn UserStore>,
    authenticator: Arc<Authenticator>,
    token_ttl: Duration,
}

impl Users {
    pub fn new(db: Arc<dyn UserStore>, authenticator: Arc<Authenticator>, token_ttl: Duration) -> Self {
        Self {
            db,
            authenticator,
            token_ttl,
        }
    }

    /// `GET /v1/users/token`: trade Basic credentials for a signed token.
    pub async fn token(&self, ctx: &mut Context, req: Request, _params: Params) -> HandlerResult {
        let (email, password) = basic_auth(req.headers())
            .ok_or_else(|| Error::unauthorized("must provide email and password in Basic auth"))?;

        let token = user::token(
            self.db.as_ref(),
            &self.authenticator,
            ctx.now(),
            &email,
            &password,
            self.token_ttl,
            ctx.deadline(),
        )
        .await?;

        JsonResponse::ok(token).into_result()
    }

    pub async fn list(&self, ctx: &mut Context, _req: Request, _params: Params) -> HandlerResult {
        let users = user::list(self.db.as_ref(), ctx.deadline()).await?;
        JsonResponse::ok(users).into_result()
    }

    pub async fn create(&self, ctx: &mut Context, req: Request, _params: Params) -> HandlerResult {
        let new: NewUser = decode(req).await?;
        let created = user::create(self.db.as_ref(), new, ctx.now(), ctx.deadline()).await?;
        JsonResponse::created(created).into_result()
    }
}
