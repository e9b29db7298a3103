//! Runtime settings assembled by `main` and injected into the services.

use warrantydesk_core::Error;

/// Shortest HMAC-SHA-256 signing key accepted, in bytes.
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// Default access-token lifetime (15 minutes).
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;

/// Default refresh-token lifetime (7 days).
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Signing and lifetime settings for access and refresh tokens.
#[derive(Clone)]
pub struct JwtSettings {
    issuer: String,
    audience: String,
    key: Vec<u8>,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl JwtSettings {
    /// Validate and build the settings with the default lifetimes.
    ///
    /// An empty issuer or audience, or a key shorter than
    /// [`MIN_SIGNING_KEY_LEN`] bytes, is rejected.
    pub fn new(issuer: &str, audience: &str, key: &[u8]) -> Result<Self, Error> {
        if issuer.trim().is_empty() {
            return Err(Error::Config("JWT issuer must not be empty".into()));
        }
        if audience.trim().is_empty() {
            return Err(Error::Config("JWT audience must not be empty".into()));
        }
        if key.len() < MIN_SIGNING_KEY_LEN {
            return Err(Error::Config(format!(
                "JWT signing key must be at least {MIN_SIGNING_KEY_LEN} bytes, got {}",
                key.len()
            )));
        }

        Ok(Self {
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            key: key.to_vec(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
        })
    }

    #[must_use]
    pub const fn with_ttls(mut self, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        self.access_ttl_secs = access_ttl_secs;
        self.refresh_ttl_secs = refresh_ttl_secs;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("key", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

/// Where browsers are sent around the payment step.
#[derive(Debug, Clone)]
pub struct PaymentUrls {
    /// Public base URL of this server; the mock gateway redirects back to it.
    pub public_base_url: String,
    /// Base URL of the single-page app.
    pub frontend_url: String,
}

impl PaymentUrls {
    pub fn new(public_base_url: &str, frontend_url: &str) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn success_redirect(&self) -> String {
        format!("{}/payment-success", self.frontend_url)
    }

    pub fn failure_redirect(&self) -> String {
        format!("{}/payment-failure", self.frontend_url)
    }
}
