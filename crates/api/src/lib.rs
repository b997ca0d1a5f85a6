//! HTTP API: server wiring, authentication middleware, and handlers.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod jwt;
pub mod middleware;
