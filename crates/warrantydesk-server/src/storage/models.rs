//! Data models for Warrantydesk storage.

use serde::{Deserialize, Serialize};

use warrantydesk_core::{CaseStatus, DocumentType};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub national_code: String,
    pub mobile_number: String,
    pub is_mobile_verified: i64,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_of_birth: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub profile_picture_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Display name carried in access tokens and comment threads.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A row of the refresh-token ledger.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: i64,
    pub revoked: i64,
    pub created_at: i64,
}

impl RefreshToken {
    pub const fn is_revoked(&self) -> bool {
        self.revoked != 0
    }

    /// Expiry is strict: a token is dead at its `expires_at` second.
    pub const fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vehicle {
    pub id: String,
    pub user_id: String,
    pub vin: String,
    pub plate_number: Option<String>,
    pub model_name: String,
    pub production_year: i64,
    pub color: Option<String>,
    pub purchase_date: Option<String>,
    pub warranty_contract_number: Option<String>,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Vehicle {
    pub fn case_status(&self) -> Result<CaseStatus, warrantydesk_core::Error> {
        self.status.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentInvoice {
    pub id: String,
    pub vehicle_id: String,
    pub amount: i64,
    pub is_paid: i64,
    pub created_at: i64,
    pub paid_at: Option<i64>,
    pub gateway_trace_id: Option<String>,
}

impl PaymentInvoice {
    pub const fn is_paid(&self) -> bool {
        self.is_paid != 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub vehicle_id: String,
    pub author_id: Option<String>,
    pub content: String,
    pub is_from_company: i64,
    pub created_at: i64,
}

impl Comment {
    pub const fn is_from_company(&self) -> bool {
        self.is_from_company != 0
    }
}

/// A user's disability record. At most one exists per user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DisabilityInfo {
    pub id: String,
    pub user_id: String,
    pub disability_percentage: i64,
    pub case_number: Option<String>,
    /// `YYYY-MM-DD`
    pub certificate_issue_date: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Metadata of an uploaded case document. The bytes live in the document
/// store under `file_path`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub vehicle_id: String,
    pub file_name: String,
    pub stored_file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    pub document_type: String,
    pub uploaded_at: i64,
}

impl Document {
    pub fn kind(&self) -> Result<DocumentType, warrantydesk_core::Error> {
        self.document_type.parse()
    }
}
