//! `Warrantydesk` Core Library
//!
//! Shared functionality for the warranty-case server:
//! - Case status lifecycle and transition rules
//! - Supporting document kinds
//! - Warranty fee policy
//! - `SQLite` pool helpers and the `define_database!` macro
//! - Tracing initialisation and common error types

pub mod db;
pub mod document;
pub mod error;
pub mod fee;
pub mod status;
pub mod tracing_init;

pub use document::DocumentType;
pub use error::{Error, Result};
pub use fee::{FeeInput, FeePolicy, FixedFee};
pub use status::CaseStatus;
