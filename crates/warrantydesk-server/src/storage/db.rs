//! Database connection and initialization.

pub use warrantydesk_core::db::DatabaseError;

warrantydesk_core::define_database!(Database, "Database migrations complete");
