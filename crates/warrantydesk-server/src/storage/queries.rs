//! User, disability record and refresh-token ledger queries.

use warrantydesk_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::{DisabilityInfo, RefreshToken, User};

/// Parameters for registering a user.
pub struct NewUser<'a> {
    pub id: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub national_code: &'a str,
    pub mobile_number: &'a str,
    pub password_hash: &'a str,
    pub date_of_birth: &'a str,
}

/// Editable profile fields.
pub struct ProfileUpdate<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a str>,
    pub address: Option<&'a str>,
    pub postal_code: Option<&'a str>,
}

/// Fields of a user's disability record.
pub struct DisabilityUpdate<'a> {
    pub disability_percentage: i64,
    pub case_number: Option<&'a str>,
    /// `YYYY-MM-DD`
    pub certificate_issue_date: Option<&'a str>,
}

/// Parameters for a new ledger entry. `token_hash` is the SHA-256 hex of
/// the opaque token handed to the client.
pub struct NewRefreshToken<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub token_hash: &'a str,
    pub expires_at: i64,
}

const INSERT_REFRESH_TOKEN: &str = "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, revoked, created_at) VALUES (?, ?, ?, ?, 0, ?)";

impl Database {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a new user.
    pub async fn create_user(&self, user: &NewUser<'_>) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, national_code, mobile_number, password_hash, date_of_birth, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.national_code)
        .bind(user.mobile_number)
        .bind(user.password_hash)
        .bind(user.date_of_birth)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(user.id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Find the unique user holding a national code.
    pub async fn get_user_by_national_code(
        &self,
        national_code: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE national_code = ?")
            .bind(national_code)
            .fetch_optional(self.pool())
            .await?;

        Ok(user)
    }

    /// Overwrite the editable profile fields. Returns `false` if the user
    /// does not exist.
    pub async fn update_user_profile(
        &self,
        id: &str,
        update: &ProfileUpdate<'_>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET first_name = ?, last_name = ?, email = ?, address = ?, postal_code = ?, updated_at = ? WHERE id = ?",
        )
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.email)
        .bind(update.address)
        .bind(update.postal_code)
        .bind(unix_timestamp())
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Disability records
    // =========================================================================

    /// Create or replace the user's disability record.
    ///
    /// `id` is only used when no record exists yet; an existing record keeps
    /// its id.
    pub async fn upsert_disability_info(
        &self,
        id: &str,
        user_id: &str,
        info: &DisabilityUpdate<'_>,
    ) -> Result<DisabilityInfo, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO disability_infos (id, user_id, disability_percentage, case_number, certificate_issue_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET disability_percentage = excluded.disability_percentage, case_number = excluded.case_number, certificate_issue_date = excluded.certificate_issue_date, updated_at = excluded.updated_at",
        )
        .bind(id)
        .bind(user_id)
        .bind(info.disability_percentage)
        .bind(info.case_number)
        .bind(info.certificate_issue_date)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_disability_info(user_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Disability record for {user_id}")))
    }

    /// Get the user's disability record, if any.
    pub async fn get_disability_info(
        &self,
        user_id: &str,
    ) -> Result<Option<DisabilityInfo>, DatabaseError> {
        let info = sqlx::query_as::<_, DisabilityInfo>(
            "SELECT * FROM disability_infos WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(info)
    }

    // =========================================================================
    // Refresh-token ledger
    // =========================================================================

    /// Append a ledger entry.
    pub async fn create_refresh_token(
        &self,
        token: &NewRefreshToken<'_>,
    ) -> Result<RefreshToken, DatabaseError> {
        sqlx::query(INSERT_REFRESH_TOKEN)
            .bind(token.id)
            .bind(token.user_id)
            .bind(token.token_hash)
            .bind(token.expires_at)
            .bind(unix_timestamp())
            .execute(self.pool())
            .await?;

        self.get_refresh_token(token.id).await
    }

    /// Get a ledger entry by ID.
    pub async fn get_refresh_token(&self, id: &str) -> Result<RefreshToken, DatabaseError> {
        sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Refresh token {id}")))
    }

    /// Find a non-revoked entry for the given token hash and owner.
    ///
    /// Expiry is not filtered here; callers decide what an expired entry means.
    pub async fn find_active_refresh_token(
        &self,
        token_hash: &str,
        user_id: &str,
    ) -> Result<Option<RefreshToken>, DatabaseError> {
        let token = sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens WHERE token_hash = ? AND user_id = ? AND revoked = 0",
        )
        .bind(token_hash)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(token)
    }

    /// Revoke a ledger entry. Returns `false` if it was already revoked.
    pub async fn revoke_refresh_token(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ? AND revoked = 0")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke `old_id` and append `successor` in one transaction.
    ///
    /// Returns `false` without writing anything when `old_id` is no longer
    /// active, which is what a concurrent rotation of the same token sees.
    pub async fn rotate_refresh_token(
        &self,
        old_id: &str,
        successor: &NewRefreshToken<'_>,
    ) -> Result<bool, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let revoked = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ? AND revoked = 0")
            .bind(old_id)
            .execute(&mut *tx)
            .await?;

        if revoked.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(INSERT_REFRESH_TOKEN)
            .bind(successor.id)
            .bind(successor.user_id)
            .bind(successor.token_hash)
            .bind(successor.expires_at)
            .bind(unix_timestamp())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
