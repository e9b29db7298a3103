//! JSON request and response bodies. Keys are camelCase on the wire.

use chrono::{DateTime, NaiveDate, SecondsFormat};
use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use warrantydesk_core::{CaseStatus, DocumentType};

use crate::auth::IssuedTokens;
use crate::server::{
    CommentView, DisabilityDetails, PaymentRequest, Registration, VehicleSubmission,
};
use crate::storage::{DisabilityInfo, Document, ProfileUpdate, User, Vehicle};

/// Render a unix timestamp as RFC 3339 (UTC, whole seconds). `None` for a
/// timestamp chrono cannot represent.
pub fn rfc3339(ts: i64) -> Option<String> {
    let rendered = DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true));
    if rendered.is_none() {
        warn!(ts, "Timestamp out of range");
    }
    rendered
}

// =========================================================================
// Auth
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub national_code: String,
    pub mobile_number: String,
    pub password: String,
    pub date_of_birth: NaiveDate,
}

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            national_code: req.national_code,
            mobile_number: req.mobile_number,
            password: req.password,
            date_of_birth: req.date_of_birth,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub national_code: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    /// The (possibly expired) access token.
    pub token: String,
    pub refresh_token: String,
}

/// Outcome of every auth call, successful or not.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub is_success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expiration: Option<String>,
}

impl AuthResponse {
    pub fn message(is_success: bool, message: impl Into<String>) -> Self {
        Self {
            is_success,
            message: message.into(),
            token: None,
            refresh_token: None,
            token_expiration: None,
        }
    }

    pub fn with_tokens(message: impl Into<String>, tokens: IssuedTokens) -> Self {
        Self {
            is_success: true,
            message: message.into(),
            token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            token_expiration: rfc3339(tokens.access_expires_at),
        }
    }
}

// =========================================================================
// Profile
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub first_name: String,
    pub last_name: String,
    pub national_code: String,
    pub mobile_number: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub date_of_birth: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            national_code: user.national_code,
            mobile_number: user.mobile_number,
            email: user.email,
            address: user.address,
            postal_code: user.postal_code,
            date_of_birth: user.date_of_birth,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

impl UpdateProfileRequest {
    pub fn as_update(&self) -> ProfileUpdate<'_> {
        ProfileUpdate {
            first_name: &self.first_name,
            last_name: &self.last_name,
            email: self.email.as_deref(),
            address: self.address.as_deref(),
            postal_code: self.postal_code.as_deref(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisabilityResponse {
    pub disability_percentage: i64,
    pub case_number: Option<String>,
    pub certificate_issue_date: Option<String>,
    pub updated_at: Option<String>,
}

impl From<DisabilityInfo> for DisabilityResponse {
    fn from(info: DisabilityInfo) -> Self {
        Self {
            disability_percentage: info.disability_percentage,
            case_number: info.case_number,
            certificate_issue_date: info.certificate_issue_date,
            updated_at: rfc3339(info.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDisabilityRequest {
    pub disability_percentage: i64,
    pub case_number: Option<String>,
    pub certificate_issue_date: Option<NaiveDate>,
}

impl From<UpdateDisabilityRequest> for DisabilityDetails {
    fn from(req: UpdateDisabilityRequest) -> Self {
        Self {
            disability_percentage: req.disability_percentage,
            case_number: req.case_number,
            certificate_issue_date: req.certificate_issue_date,
        }
    }
}

// =========================================================================
// Vehicles
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub vin: String,
    pub model_name: String,
    pub production_year: i64,
    pub plate_number: Option<String>,
    pub color: Option<String>,
}

impl From<CreateVehicleRequest> for VehicleSubmission {
    fn from(req: CreateVehicleRequest) -> Self {
        Self {
            vin: req.vin,
            model_name: req.model_name,
            production_year: req.production_year,
            plate_number: req.plate_number,
            color: req.color,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: String,
    pub vin: String,
    pub model_name: String,
    pub production_year: i64,
    pub plate_number: Option<String>,
    pub color: Option<String>,
    pub status: CaseStatus,
    pub created_at: Option<String>,
}

impl TryFrom<Vehicle> for VehicleResponse {
    type Error = warrantydesk_core::Error;

    fn try_from(vehicle: Vehicle) -> Result<Self, Self::Error> {
        Ok(Self {
            status: vehicle.case_status()?,
            created_at: rfc3339(vehicle.created_at),
            id: vehicle.id,
            vin: vehicle.vin,
            model_name: vehicle.model_name,
            production_year: vehicle.production_year,
            plate_number: vehicle.plate_number,
            color: vehicle.color,
        })
    }
}

// =========================================================================
// Documents
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub uploaded_at: Option<String>,
}

impl TryFrom<Document> for DocumentResponse {
    type Error = warrantydesk_core::Error;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        Ok(Self {
            document_type: doc.kind()?,
            uploaded_at: rfc3339(doc.uploaded_at),
            id: doc.id,
            file_name: doc.file_name,
            file_path: doc.file_path,
            file_size: doc.file_size,
            content_type: doc.content_type,
        })
    }
}

// =========================================================================
// Comments
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub content: String,
    pub is_from_company: bool,
    pub created_at: Option<String>,
    pub author_name: String,
}

impl From<CommentView> for CommentResponse {
    fn from(view: CommentView) -> Self {
        Self {
            is_from_company: view.comment.is_from_company(),
            created_at: rfc3339(view.comment.created_at),
            id: view.comment.id,
            content: view.comment.content,
            author_name: view.author_name,
        }
    }
}

// =========================================================================
// Payment
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestResponse {
    pub invoice_id: String,
    pub amount: i64,
    pub payment_url: String,
}

impl From<PaymentRequest> for PaymentRequestResponse {
    fn from(req: PaymentRequest) -> Self {
        Self {
            invoice_id: req.invoice.id,
            amount: req.invoice.amount,
            payment_url: req.redirect_url,
        }
    }
}

/// Query string the gateway calls back with. Gateways differ in casing, so
/// both camelCase and PascalCase keys are read and `isSuccess` accepts
/// `true`/`false` in any case.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallbackQuery {
    #[serde(alias = "InvoiceId", alias = "invoiceid")]
    pub invoice_id: String,
    #[serde(
        alias = "IsSuccess",
        alias = "issuccess",
        deserialize_with = "bool_ignoring_case"
    )]
    pub is_success: bool,
    #[serde(default, alias = "TraceId", alias = "traceid")]
    pub trace_id: Option<String>,
}

fn bool_ignoring_case<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(de)?;
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(D::Error::invalid_value(Unexpected::Str(&raw), &"true or false"))
    }
}
