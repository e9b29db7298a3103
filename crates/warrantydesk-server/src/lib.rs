//! Warrantydesk Server Library
//!
//! Core functionality for the warranty-case server:
//! - SQLite storage for users, disability records, the refresh-token
//!   ledger, vehicles, invoices, comments and documents
//! - Access-token issuance, refresh-token rotation and password hashing
//! - Domain services (auth, profile, vehicles, documents, comments, payment)
//! - REST API router

pub mod api;
pub mod auth;
pub mod config;
pub mod server;
pub mod storage;
