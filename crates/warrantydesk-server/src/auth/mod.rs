//! Authentication for the Warrantydesk server.
//!
//! Provides access-token management, refresh-token generation and
//! password hashing.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod refresh;

pub use claims::Claims;
pub use jwt::{IssuedTokens, JwtManager};
