//! Domain services for the Warrantydesk server.
//!
//! Each service takes the authenticated user id as an explicit argument;
//! nothing is read from ambient request state.

pub mod auth_svc;
pub mod comment_svc;
pub mod document_svc;
pub mod error;
pub mod payment_svc;
pub mod profile_svc;
pub mod vehicle_svc;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod auth_svc_tests;

pub use auth_svc::{AuthService, Registration};
pub use comment_svc::{CommentService, CommentView};
pub use document_svc::{
    DocumentService, DocumentStore, DocumentUpload, LocalDocumentStore, MAX_DOCUMENT_BYTES,
};
pub use error::ServiceError;
pub use payment_svc::{MockGateway, PaymentGateway, PaymentRequest, PaymentService};
pub use profile_svc::{DisabilityDetails, ProfileService};
pub use vehicle_svc::{VehicleService, VehicleSubmission};
