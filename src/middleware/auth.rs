use std::sync::Arc;

use tracing::{debug, Span};

use crate::auth::Authenticator;
use crate::error::Error;
use crate::web::{bearer_token, BoxFuture, Context, HandlerResult, Middleware, Next, Params, Request};

/// Verifies the bearer token and stores its claims in the context.
///
/// Every failure is the same 401 to the caller; the reason is only logged.
pub struct Authenticate {
    authenticator: Arc<Authenticator>,
    log: Span,
}

impl Authenticate {
    pub fn new(authenticator: Arc<Authenticator>, log: Span) -> Self {
        Self { authenticator, log }
    }
}

impl Middleware for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
        params: Params,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        let verified = match bearer_token(req.headers()) {
            Some(token) => self.authenticator.parse_claims(token).map_err(|e| e.to_string()),
            None => Err("expected authorization header format: Bearer <token>".to_string()),
        };

        let claims = match verified {
            Ok(claims) => claims,
            Err(reason) => {
                self.log.in_scope(|| debug!(trace_id = %ctx.trace_id(), %reason, "authentication failed"));
                return Box::pin(async { Err(unauthorized()) });
            }
        };

        ctx.set_claims(claims);
        next.run(ctx, req, params)
    }
}

/// Admits callers holding any of the listed roles.
pub struct HasRole {
    roles: Vec<String>,
}

impl HasRole {
    pub fn new(roles: &[&str]) -> Self {
        Self {
            roles: roles.iter().map(|role| role.to_string()).collect(),
        }
    }
}

impl Middleware for HasRole {
    fn name(&self) -> &'static str {
        "has_role"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
        params: Params,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        let allowed = ctx.claims().map(|claims| {
            claims
                .roles
                .iter()
                .any(|have| self.roles.iter().any(|want| want == have))
        });

        match allowed {
            Ok(true) => next.run(ctx, req, params),
            Ok(false) => Box::pin(async { Err(Error::forbidden("you are not authorized for that action")) }),
            Err(err) => Box::pin(async { Err(err) }),
        }
    }
}

fn unauthorized() -> Error {
    Error::unauthorized("Unauthorized")
}
