//! Registration, login and session refresh.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};
use warrantydesk_core::db::unix_timestamp;

use super::error::ServiceError;
use crate::auth::jwt::{IssuedTokens, JwtManager};
use crate::auth::password;
use crate::storage::{Database, DatabaseError, NewRefreshToken, NewUser, User};

pub const NATIONAL_CODE_LEN: usize = 10;
pub const MOBILE_NUMBER_LEN: usize = 11;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Fields supplied at sign-up.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub national_code: String,
    pub mobile_number: String,
    pub password: String,
    pub date_of_birth: NaiveDate,
}

impl Registration {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(ServiceError::validation("First and last name are required"));
        }
        if self.national_code.chars().count() != NATIONAL_CODE_LEN {
            return Err(ServiceError::validation(format!(
                "National code must be {NATIONAL_CODE_LEN} characters"
            )));
        }
        if self.mobile_number.chars().count() != MOBILE_NUMBER_LEN {
            return Err(ServiceError::validation(format!(
                "Mobile number must be {MOBILE_NUMBER_LEN} characters"
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Authentication operations over the credential store and the
/// refresh-token ledger.
pub struct AuthService {
    db: Database,
    jwt: Arc<JwtManager>,
}

impl AuthService {
    pub fn new(db: Database, jwt: Arc<JwtManager>) -> Self {
        Self { db, jwt }
    }

    /// Create an account. No tokens are issued; the client logs in next.
    #[instrument(skip(self, reg), fields(op = "register"))]
    pub async fn register(&self, reg: &Registration) -> Result<User, ServiceError> {
        reg.validate()?;

        if self
            .db
            .get_user_by_national_code(&reg.national_code)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "A user with this national code is already registered".into(),
            ));
        }

        let hash = password::hash_password(&reg.password)
            .map_err(|e| ServiceError::internal("Password hashing failed", e))?;

        let user_id = uuid::Uuid::new_v4().to_string();
        let date_of_birth = reg.date_of_birth.to_string();
        let user = self
            .db
            .create_user(&NewUser {
                id: &user_id,
                first_name: reg.first_name.trim(),
                last_name: reg.last_name.trim(),
                national_code: &reg.national_code,
                mobile_number: &reg.mobile_number,
                password_hash: &hash,
                date_of_birth: &date_of_birth,
            })
            .await
            .map_err(|e| match e {
                // Lost a race on the national code, or the mobile number is taken.
                DatabaseError::Conflict(_) => ServiceError::Conflict(
                    "A user with this national code or mobile number is already registered"
                        .into(),
                ),
                other => other.into(),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verify credentials and open a session.
    ///
    /// An unknown national code and a wrong password fail identically.
    #[instrument(skip(self, national_code, password), fields(op = "login"))]
    pub async fn login(
        &self,
        national_code: &str,
        password: &str,
    ) -> Result<IssuedTokens, ServiceError> {
        let Some(user) = self.db.get_user_by_national_code(national_code).await? else {
            warn!(national_code = %national_code, "Failed login attempt");
            return Err(ServiceError::InvalidCredentials);
        };

        let valid = password::verify_password(password, &user.password_hash)
            .map_err(|e| ServiceError::internal("Password verification failed", e))?;

        if !valid {
            warn!(national_code = %national_code, "Failed login attempt");
            return Err(ServiceError::InvalidCredentials);
        }

        let tokens = self.issue_for(&user)?;

        let token_id = uuid::Uuid::new_v4().to_string();
        let token_hash = JwtManager::hash_token(&tokens.refresh_token);
        self.db
            .create_refresh_token(&NewRefreshToken {
                id: &token_id,
                user_id: &user.id,
                token_hash: &token_hash,
                expires_at: tokens.refresh_expires_at,
            })
            .await?;

        info!(user_id = %user.id, "User logged in");
        Ok(tokens)
    }

    /// Exchange an access token (expired or not) and its refresh token for
    /// a new pair. The presented refresh token is revoked in the same
    /// transaction that records its successor.
    #[instrument(skip(self, access_token, refresh_token), fields(op = "refresh"))]
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<IssuedTokens, ServiceError> {
        let claims = self
            .jwt
            .validate_ignoring_expiry(access_token)
            .map_err(|_| ServiceError::InvalidToken)?;

        if claims.user_id().is_none() {
            return Err(ServiceError::InvalidToken);
        }
        let user_id = claims.sub;

        let token_hash = JwtManager::hash_token(refresh_token);
        let stored = self
            .db
            .find_active_refresh_token(&token_hash, &user_id)
            .await?
            .ok_or(ServiceError::InvalidRefreshToken)?;

        let user = match self.db.get_user(&user_id).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => return Err(ServiceError::InvalidRefreshToken),
            Err(e) => return Err(e.into()),
        };

        if stored.is_expired_at(unix_timestamp()) {
            return Err(ServiceError::InvalidRefreshToken);
        }

        let tokens = self.issue_for(&user)?;

        let new_token_id = uuid::Uuid::new_v4().to_string();
        let new_hash = JwtManager::hash_token(&tokens.refresh_token);
        let rotated = self
            .db
            .rotate_refresh_token(
                &stored.id,
                &NewRefreshToken {
                    id: &new_token_id,
                    user_id: &user.id,
                    token_hash: &new_hash,
                    expires_at: tokens.refresh_expires_at,
                },
            )
            .await?;

        if !rotated {
            warn!(user_id = %user.id, "Refresh token already rotated");
            return Err(ServiceError::InvalidRefreshToken);
        }

        info!(user_id = %user.id, "Session refreshed");
        Ok(tokens)
    }

    fn issue_for(&self, user: &User) -> Result<IssuedTokens, ServiceError> {
        self.jwt
            .issue(&user.id, &user.full_name())
            .map_err(|e| ServiceError::internal("Token creation failed", e))
    }
}
