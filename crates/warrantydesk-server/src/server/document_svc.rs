//! Supporting documents uploaded against a warranty case.
//!
//! File bytes go to a [`DocumentStore`]; the database only records where
//! they landed. Uploading to a case that is `AwaitingDocuments` moves it on
//! to `UnderReview`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};
use warrantydesk_core::{CaseStatus, DocumentType};

use super::error::ServiceError;
use super::vehicle_svc::owned_vehicle;
use crate::storage::{Database, Document, NewDocument};

/// Largest accepted document, in bytes.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

const MAX_EXTENSION_LEN: usize = 10;

/// Where uploaded document bytes are kept.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write `bytes` as `stored_name` inside `folder`. Returns the path to
    /// record, relative to the store root.
    async fn save(&self, folder: &str, stored_name: &str, bytes: &[u8]) -> std::io::Result<String>;

    /// Remove a previously saved file.
    async fn remove(&self, relative_path: &str) -> std::io::Result<()>;
}

/// Stores documents under `<root>/uploads/<folder>/`.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn save(&self, folder: &str, stored_name: &str, bytes: &[u8]) -> std::io::Result<String> {
        let dir = self.root.join("uploads").join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(stored_name), bytes).await?;
        Ok(format!("uploads/{folder}/{stored_name}"))
    }

    async fn remove(&self, relative_path: &str) -> std::io::Result<()> {
        tokio::fs::remove_file(self.root.join(relative_path)).await
    }
}

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: String,
    pub document_type: DocumentType,
    pub bytes: Vec<u8>,
}

pub struct DocumentService {
    db: Database,
    store: Arc<dyn DocumentStore>,
}

impl DocumentService {
    pub fn new(db: Database, store: Arc<dyn DocumentStore>) -> Self {
        Self { db, store }
    }

    /// Attach a document to one of the caller's vehicles.
    ///
    /// Empty or oversized files are rejected before anything is written.
    /// Absent and foreign vehicles are `AccessDenied`.
    #[instrument(skip(self, upload), fields(op = "upload_document", size = upload.bytes.len()))]
    pub async fn upload_document(
        &self,
        vehicle_id: &str,
        user_id: &str,
        upload: &DocumentUpload,
    ) -> Result<Document, ServiceError> {
        if upload.bytes.is_empty() {
            return Err(ServiceError::validation("File is required"));
        }
        if upload.bytes.len() > MAX_DOCUMENT_BYTES {
            return Err(ServiceError::validation(format!(
                "File must be at most {MAX_DOCUMENT_BYTES} bytes"
            )));
        }

        let Some(vehicle) = owned_vehicle(&self.db, vehicle_id, user_id).await? else {
            warn!(vehicle_id = %vehicle_id, user_id = %user_id, "Document upload for unowned vehicle");
            return Err(ServiceError::AccessDenied);
        };

        let file_name = display_name(&upload.file_name);
        let id = uuid::Uuid::new_v4().to_string();
        let stored_file_name = format!("{id}{}", extension(file_name));

        let file_path = self
            .store
            .save(&vehicle.id, &stored_file_name, &upload.bytes)
            .await
            .map_err(|e| ServiceError::internal("Saving document", e))?;

        let content_type = if upload.content_type.trim().is_empty() {
            "application/octet-stream"
        } else {
            upload.content_type.trim()
        };

        let created = self
            .db
            .create_document(&NewDocument {
                id: &id,
                vehicle_id: &vehicle.id,
                file_name,
                stored_file_name: &stored_file_name,
                file_path: &file_path,
                file_size: i64::try_from(upload.bytes.len()).unwrap_or(i64::MAX),
                content_type,
                document_type: upload.document_type,
            })
            .await;

        let document = match created {
            Ok(document) => document,
            Err(e) => {
                if let Err(rm) = self.store.remove(&file_path).await {
                    warn!(path = %file_path, error = %rm, "Failed to remove orphaned document");
                }
                return Err(e.into());
            }
        };

        info!(
            vehicle_id = %vehicle.id,
            document_id = %document.id,
            kind = %upload.document_type,
            "Document uploaded"
        );

        if vehicle.case_status().ok() == Some(CaseStatus::AwaitingDocuments)
            && self
                .db
                .transition_vehicle_status(
                    &vehicle.id,
                    CaseStatus::AwaitingDocuments,
                    CaseStatus::UnderReview,
                )
                .await?
        {
            info!(vehicle_id = %vehicle.id, "Case moved to review");
        }

        Ok(document)
    }

    /// Documents on one of the caller's vehicles. Vehicles the caller does
    /// not own yield an empty list.
    pub async fn list_documents(
        &self,
        vehicle_id: &str,
        user_id: &str,
    ) -> Result<Vec<Document>, ServiceError> {
        if owned_vehicle(&self.db, vehicle_id, user_id).await?.is_none() {
            return Ok(Vec::new());
        }
        Ok(self.db.list_documents(vehicle_id).await?)
    }
}

/// The client's file name without any directory part.
fn display_name(raw: &str) -> &str {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    if name.is_empty() { "document" } else { name }
}

/// `.ext` of a file name, lowercased, or empty when there is no usable one.
fn extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}
