//! Case comment threads between owners and company staff.

use tracing::{info, instrument};

use super::error::ServiceError;
use super::vehicle_svc::owned_vehicle;
use crate::storage::{Comment, Database, NewComment};

/// Author name shown on comments written by staff.
pub const COMPANY_AUTHOR_NAME: &str = "Company Support";

pub const MAX_COMMENT_LEN: usize = 1000;

/// A comment with its resolved author name.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub author_name: String,
}

pub struct CommentService {
    db: Database,
}

impl CommentService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Comments on one of the caller's vehicles, oldest first. Vehicles the
    /// caller does not own yield an empty thread.
    pub async fn list_comments(
        &self,
        vehicle_id: &str,
        user_id: &str,
    ) -> Result<Vec<CommentView>, ServiceError> {
        if owned_vehicle(&self.db, vehicle_id, user_id).await?.is_none() {
            return Ok(Vec::new());
        }

        let owner_name = self.db.get_user(user_id).await?.full_name();
        let comments = self.db.list_comments(vehicle_id).await?;

        Ok(comments
            .into_iter()
            .map(|comment| {
                let author_name = if comment.is_from_company() {
                    COMPANY_AUTHOR_NAME.to_string()
                } else {
                    owner_name.clone()
                };
                CommentView {
                    comment,
                    author_name,
                }
            })
            .collect())
    }

    /// Post a comment as the vehicle's owner.
    #[instrument(skip(self, content), fields(op = "create_comment"))]
    pub async fn create_comment(
        &self,
        vehicle_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<CommentView, ServiceError> {
        let content = content.trim();
        if content.is_empty() || content.chars().count() > MAX_COMMENT_LEN {
            return Err(ServiceError::validation(format!(
                "Comment must be between 1 and {MAX_COMMENT_LEN} characters"
            )));
        }

        if owned_vehicle(&self.db, vehicle_id, user_id).await?.is_none() {
            return Err(ServiceError::AccessDenied);
        }

        let owner = self.db.get_user(user_id).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let comment = self
            .db
            .create_comment(&NewComment {
                id: &id,
                vehicle_id,
                author_id: Some(user_id),
                content,
                is_from_company: false,
            })
            .await?;

        info!(vehicle_id = %vehicle_id, comment_id = %comment.id, "Comment posted");
        Ok(CommentView {
            comment,
            author_name: owner.full_name(),
        })
    }
}
