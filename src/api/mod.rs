//! HTTP API surface

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use auth::AuthService;
pub use auth::AuthUser;
pub use server::serve_api;
