//! Middleware stages. The global ones wrap every route in this order:
//! [`Logger`], [`Errors`], [`RequestMetrics`], [`Panics`]. Route stages such as
//! [`Authenticate`] and [`HasRole`] follow them.

pub mod auth;
pub mod errors;
pub mod logger;
pub mod metrics;
pub mod panics;

pub use auth::{Authenticate, HasRole};
pub use errors::Errors;
pub use logger::Logger;
pub use metrics::{Metrics, MetricsSnapshot, RequestMetrics};
pub use panics::Panics;
