//! Profile and disability record of the authenticated user.

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use tracing::{info, instrument};

use super::error::ServiceError;
use super::vehicle_svc::non_blank;
use crate::storage::{Database, DisabilityInfo, DisabilityUpdate, ProfileUpdate, User};

pub const DISABILITY_PERCENTAGE_RANGE: RangeInclusive<i64> = 0..=100;

/// Submitted disability details.
#[derive(Debug, Clone)]
pub struct DisabilityDetails {
    pub disability_percentage: i64,
    pub case_number: Option<String>,
    pub certificate_issue_date: Option<NaiveDate>,
}

pub struct ProfileService {
    db: Database,
}

impl ProfileService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<User, ServiceError> {
        Ok(self.db.get_user(user_id).await?)
    }

    /// Overwrite the editable fields. Blank optional fields are cleared.
    #[instrument(skip(self, update), fields(op = "update_profile"))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate<'_>,
    ) -> Result<User, ServiceError> {
        let first_name = update.first_name.trim();
        let last_name = update.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(ServiceError::validation("First and last name are required"));
        }

        let normalized = ProfileUpdate {
            first_name,
            last_name,
            email: non_blank(update.email),
            address: non_blank(update.address),
            postal_code: non_blank(update.postal_code),
        };

        if !self.db.update_user_profile(user_id, &normalized).await? {
            return Err(ServiceError::NotFound(format!("User {user_id}")));
        }

        info!(user_id = %user_id, "Profile updated");
        Ok(self.db.get_user(user_id).await?)
    }

    /// The caller's disability record, if one was recorded.
    pub async fn get_disability(&self, user_id: &str) -> Result<Option<DisabilityInfo>, ServiceError> {
        self.db.get_user(user_id).await?;
        Ok(self.db.get_disability_info(user_id).await?)
    }

    /// Create or replace the caller's disability record.
    #[instrument(skip(self, details), fields(op = "set_disability"))]
    pub async fn set_disability(
        &self,
        user_id: &str,
        details: &DisabilityDetails,
    ) -> Result<DisabilityInfo, ServiceError> {
        if !DISABILITY_PERCENTAGE_RANGE.contains(&details.disability_percentage) {
            return Err(ServiceError::validation(
                "Disability percentage must be between 0 and 100",
            ));
        }

        self.db.get_user(user_id).await?;

        let issued = details.certificate_issue_date.map(|d| d.to_string());
        let id = uuid::Uuid::new_v4().to_string();
        let info = self
            .db
            .upsert_disability_info(
                &id,
                user_id,
                &DisabilityUpdate {
                    disability_percentage: details.disability_percentage,
                    case_number: non_blank(details.case_number.as_deref()),
                    certificate_issue_date: issued.as_deref(),
                },
            )
            .await?;

        info!(user_id = %user_id, percentage = info.disability_percentage, "Disability record saved");
        Ok(info)
    }
}
