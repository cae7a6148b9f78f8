//! Endpoint handlers and the route tables that wire them to middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use tracing::Span;

use crate::auth::{Authenticator, ROLE_ADMIN};
use crate::database::StatusCheck;
use crate::middleware::{Authenticate, Errors, HasRole, Logger, Metrics, Panics, RequestMetrics};
use crate::restaurant::{MenuStore, RestaurantStore};
use crate::server::ShutdownHandle;
use crate::user::UserStore;
use crate::web::{bind, App, Middleware};

mod check;
mod debug;
mod menu;
mod restaurant;
mod user;

pub use check::Check;
pub use debug::Diagnostics;
pub use menu::Menus;
pub use restaurant::Restaurants;
pub use user::Users;

/// Everything the API routes need from the outside world.
pub struct ApiDeps<D> {
    pub build: String,
    pub shutdown: ShutdownHandle,
    pub log: Span,
    pub db: Arc<D>,
    pub authenticator: Arc<Authenticator>,
    pub metrics: Arc<Metrics>,
    pub request_timeout: Duration,
    pub token_ttl: chrono::Duration,
}

/// The public API: health, users, restaurants and menus.
pub fn api<D>(deps: ApiDeps<D>) -> App
where
    D: UserStore + RestaurantStore + MenuStore + StatusCheck + 'static,
{
    let ApiDeps {
        build,
        shutdown,
        log,
        db,
        authenticator,
        metrics,
        request_timeout,
        token_ttl,
    } = deps;

    let global: Vec<Arc<dyn Middleware>> = vec![
        Arc::new(Logger::new(log.clone())),
        Arc::new(Errors::new(log.clone())),
        Arc::new(RequestMetrics::new(metrics)),
        Arc::new(Panics),
    ];
    let mut app = App::new(shutdown, log.clone(), global).with_request_timeout(request_timeout);

    let authenticate: Arc<dyn Middleware> = Arc::new(Authenticate::new(authenticator.clone(), log));
    let admin: Arc<dyn Middleware> = Arc::new(HasRole::new(&[ROLE_ADMIN]));

    let check = Arc::new(Check::new(build, db.clone()));
    app.handle(
        Method::GET,
        "/v1/health",
        bind(&check, |c, ctx, req, p| Box::pin(c.health(ctx, req, p))),
        &[],
    );

    let users = Arc::new(Users::new(db.clone(), authenticator, token_ttl));
    app.handle(
        Method::GET,
        "/v1/users/token",
        bind(&users, |u, ctx, req, p| Box::pin(u.token(ctx, req, p))),
        &[],
    );
    app.handle(
        Method::GET,
        "/v1/users",
        bind(&users, |u, ctx, req, p| Box::pin(u.list(ctx, req, p))),
        &[authenticate.clone(), admin.clone()],
    );
    app.handle(
        Method::POST,
        "/v1/users",
        bind(&users, |u, ctx, req, p| Box::pin(u.create(ctx, req, p))),
        &[authenticate.clone(), admin.clone()],
    );

    let restaurants = Arc::new(Restaurants::new(db.clone()));
    app.handle(
        Method::GET,
        "/v1/restaurant",
        bind(&restaurants, |r, ctx, req, p| Box::pin(r.list(ctx, req, p))),
        &[authenticate.clone()],
    );
    app.handle(
        Method::POST,
        "/v1/restaurant",
        bind(&restaurants, |r, ctx, req, p| Box::pin(r.create(ctx, req, p))),
        &[authenticate.clone()],
    );
    app.handle(
        Method::GET,
        "/v1/restaurant/:id",
        bind(&restaurants, |r, ctx, req, p| Box::pin(r.retrieve(ctx, req, p))),
        &[authenticate.clone()],
    );
    app.handle(
        Method::PUT,
        "/v1/restaurant/:id",
        bind(&restaurants, |r, ctx, req, p| Box::pin(r.update(ctx, req, p))),
        &[authenticate.clone()],
    );
    app.handle(
        Method::DELETE,
        "/v1/restaurant/:id",
        bind(&restaurants, |r, ctx, req, p| Box::pin(r.delete(ctx, req, p))),
        &[authenticate.clone()],
    );

    let menus = Arc::new(Menus::new(db.clone(), db));
    app.handle(
        Method::GET,
        "/v1/restaurant/:restaurantId/menu",
        bind(&menus, |m, ctx, req, p| Box::pin(m.retrieve(ctx, req, p))),
        &[authenticate.clone()],
    );
    app.handle(
        Method::GET,
        "/v1/restaurant/:restaurantId/votes",
        bind(&menus, |m, ctx, req, p| Box::pin(m.votes(ctx, req, p))),
        &[authenticate.clone()],
    );
    app.handle(
        Method::POST,
        "/v1/restaurant/:restaurantId/menu",
        bind(&menus, |m, ctx, req, p| Box::pin(m.create(ctx, req, p))),
        &[authenticate, admin],
    );

    app
}

/// The diagnostics listener. It is not counted by the request metrics it
/// reports.
pub fn debug(build: String, shutdown: ShutdownHandle, log: Span, metrics: Arc<Metrics>) -> App {
    let global: Vec<Arc<dyn Middleware>> = vec![
        Arc::new(Logger::new(log.clone())),
        Arc::new(Errors::new(log.clone())),
        Arc::new(Panics),
    ];
    let mut app = App::new(shutdown, log, global);

    let diagnostics = Arc::new(Diagnostics::new(build, metrics));
    app.handle(
        Method::GET,
        "/debug/vars",
        bind(&diagnostics, |d, ctx, req, p| Box::pin(d.vars(ctx, req, p))),
        &[],
    );

    app
}
