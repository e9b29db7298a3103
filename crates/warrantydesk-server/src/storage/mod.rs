//! `SQLite` storage for the Warrantydesk server.
//!
//! Provides persistence for users, the refresh-token ledger, vehicles,
//! payment invoices, case comments and documents, and disability records.

mod db;
mod models;
mod queries;
mod queries_cases;
mod queries_documents;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;

pub use db::{Database, DatabaseError};
pub use models::*;
pub use queries::{DisabilityUpdate, NewRefreshToken, NewUser, ProfileUpdate};
pub use queries_cases::{NewComment, NewInvoice, NewVehicle};
pub use queries_documents::NewDocument;
