//! Request-handling framework: router, per-request context, handler and
//! middleware contracts, body decoding and response helpers.

use axum::body::Body;

mod app;
mod context;
mod pipeline;
mod request;
mod respond;
mod route;
mod validate;

pub use app::{App, AppService};
pub use context::Context;
pub use pipeline::{bind, handler_fn, BoxFuture, Handler, HandlerResult, Middleware, Next, Route};
pub use request::{basic_auth, bearer_token, decode, remote_addr};
pub use respond::{respond, JsonResponse};
pub use route::{Params, PathPattern};
pub use validate::{Validate, Violations};

pub type Request = axum::http::Request<Body>;
pub type Response = axum::response::Response;
