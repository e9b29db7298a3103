//! Access-token issuance and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use warrantydesk_core::db::unix_timestamp;

use super::claims::Claims;
use super::refresh::generate_refresh_token;
use crate::config::JwtSettings;

/// The only algorithm tokens are minted with or accepted under.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// An access/refresh pair handed to a client.
///
/// The refresh token is opaque; callers persist its hash in the ledger.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub access_expires_at: i64,
    pub refresh_token: String,
    pub refresh_expires_at: i64,
}

/// Manages access-token creation and validation.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl JwtManager {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.key()),
            decoding_key: DecodingKey::from_secret(settings.key()),
            issuer: settings.issuer().to_string(),
            audience: settings.audience().to_string(),
            access_ttl_secs: settings.access_ttl_secs,
            refresh_ttl_secs: settings.refresh_ttl_secs,
        }
    }

    /// Issue a fresh access/refresh pair for a user. Nothing is persisted.
    pub fn issue(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<IssuedTokens, jsonwebtoken::errors::Error> {
        let (access_token, access_expires_at) = self.issue_access_token(user_id, name)?;

        Ok(IssuedTokens {
            access_token,
            access_expires_at,
            refresh_token: generate_refresh_token(),
            refresh_expires_at: unix_timestamp() + self.refresh_ttl_secs,
        })
    }

    /// Issue an access token. Returns the token and its expiry timestamp.
    pub fn issue_access_token(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<(String, i64), jsonwebtoken::errors::Error> {
        let now = unix_timestamp();
        let exp = now + self.access_ttl_secs;

        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)?;
        Ok((token, exp))
    }

    /// Validate a token for a normal authenticated call: signature,
    /// algorithm, issuer, audience, and expiry.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        self.decode(token, true)
    }

    /// Validate everything [`Self::validate`] does except expiry.
    ///
    /// Used only on the refresh path, where the token proves who is asking
    /// and freshness comes from the refresh token instead.
    pub fn validate_ignoring_expiry(
        &self,
        token: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        self.decode(token, false)
    }

    fn decode(&self, token: &str, validate_exp: bool) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = 0;
        validation.validate_exp = validate_exp;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Hash a refresh token for the ledger (raw tokens are never stored).
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
