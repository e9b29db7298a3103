//! JWT claims structure for Warrantydesk access tokens.

use serde::{Deserialize, Serialize};

/// Claims embedded in access tokens. Every field is covered by the
/// signature and checked on validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Display name ("first last").
    pub name: String,
    /// JWT ID (unique per token).
    pub jti: String,
    pub iss: String,
    pub aud: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// The subject as a user ID, if it is one.
    pub fn user_id(&self) -> Option<uuid::Uuid> {
        uuid::Uuid::parse_str(&self.sub).ok()
    }
}
