pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod restaurant;
pub mod server;
pub mod user;
pub mod web;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
