//! REST API over the domain services.

pub mod dto;
mod error;
pub mod extract;
pub mod routes;

pub use extract::AuthUser;
pub use routes::{AppState, build_router};
