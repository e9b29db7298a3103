//! Case document queries.

use warrantydesk_core::DocumentType;
use warrantydesk_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::Document;

/// Parameters for recording an uploaded document.
pub struct NewDocument<'a> {
    pub id: &'a str,
    pub vehicle_id: &'a str,
    pub file_name: &'a str,
    pub stored_file_name: &'a str,
    pub file_path: &'a str,
    pub file_size: i64,
    pub content_type: &'a str,
    pub document_type: DocumentType,
}

impl Database {
    /// Record a document already written to the document store.
    pub async fn create_document(&self, doc: &NewDocument<'_>) -> Result<Document, DatabaseError> {
        sqlx::query(
            "INSERT INTO documents (id, vehicle_id, file_name, stored_file_name, file_path, file_size, content_type, document_type, uploaded_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(doc.id)
        .bind(doc.vehicle_id)
        .bind(doc.file_name)
        .bind(doc.stored_file_name)
        .bind(doc.file_path)
        .bind(doc.file_size)
        .bind(doc.content_type)
        .bind(doc.document_type.as_str())
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?")
            .bind(doc.id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Document {}", doc.id)))
    }

    /// List a case's documents in upload order.
    pub async fn list_documents(&self, vehicle_id: &str) -> Result<Vec<Document>, DatabaseError> {
        let documents = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE vehicle_id = ? ORDER BY uploaded_at ASC, rowid ASC",
        )
        .bind(vehicle_id)
        .fetch_all(self.pool())
        .await?;

        Ok(documents)
    }
}
