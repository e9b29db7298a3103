//! Vehicle, payment invoice, and comment queries.

use warrantydesk_core::CaseStatus;
use warrantydesk_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::{Comment, PaymentInvoice, Vehicle};

/// Parameters for submitting a vehicle.
pub struct NewVehicle<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub vin: &'a str,
    pub model_name: &'a str,
    pub production_year: i64,
    pub plate_number: Option<&'a str>,
    pub color: Option<&'a str>,
}

/// Parameters for a new, unpaid invoice.
pub struct NewInvoice<'a> {
    pub id: &'a str,
    pub vehicle_id: &'a str,
    pub amount: i64,
}

/// Parameters for a case comment.
pub struct NewComment<'a> {
    pub id: &'a str,
    pub vehicle_id: &'a str,
    pub author_id: Option<&'a str>,
    pub content: &'a str,
    pub is_from_company: bool,
}

impl Database {
    // =========================================================================
    // Vehicle queries
    // =========================================================================

    /// Submit a vehicle. New cases start in [`CaseStatus::Submitted`].
    pub async fn create_vehicle(&self, vehicle: &NewVehicle<'_>) -> Result<Vehicle, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO vehicles (id, user_id, vin, model_name, production_year, plate_number, color, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(vehicle.id)
        .bind(vehicle.user_id)
        .bind(vehicle.vin)
        .bind(vehicle.model_name)
        .bind(vehicle.production_year)
        .bind(vehicle.plate_number)
        .bind(vehicle.color)
        .bind(CaseStatus::Submitted.as_str())
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_vehicle(vehicle.id).await
    }

    /// Get a vehicle by ID.
    pub async fn get_vehicle(&self, id: &str) -> Result<Vehicle, DatabaseError> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Vehicle {id}")))
    }

    /// List a user's vehicles, newest first.
    pub async fn list_vehicles(&self, user_id: &str) -> Result<Vec<Vehicle>, DatabaseError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(vehicles)
    }

    /// Move a case from `from` to `to`.
    ///
    /// Writes only when the lifecycle allows the move and the stored status
    /// is still `from`. Returns `false` otherwise, including for a missing
    /// vehicle.
    pub async fn transition_vehicle_status(
        &self,
        id: &str,
        from: CaseStatus,
        to: CaseStatus,
    ) -> Result<bool, DatabaseError> {
        if !from.can_transition_to(to) {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE vehicles SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to.as_str())
        .bind(unix_timestamp())
        .bind(id)
        .bind(from.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Payment invoice queries
    // =========================================================================

    /// Insert an unpaid invoice and move its vehicle from `from` to
    /// [`CaseStatus::AwaitingPayment`] in one transaction.
    ///
    /// Returns `None` and writes nothing when the lifecycle forbids the move
    /// or the stored status is no longer `from`.
    pub async fn open_payment_request(
        &self,
        invoice: &NewInvoice<'_>,
        from: CaseStatus,
    ) -> Result<Option<PaymentInvoice>, DatabaseError> {
        if !from.can_transition_to(CaseStatus::AwaitingPayment) {
            return Ok(None);
        }

        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        let moved = sqlx::query(
            "UPDATE vehicles SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(CaseStatus::AwaitingPayment.as_str())
        .bind(now)
        .bind(invoice.vehicle_id)
        .bind(from.as_str())
        .execute(&mut *tx)
        .await?;

        if moved.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO payment_invoices (id, vehicle_id, amount, is_paid, created_at) VALUES (?, ?, ?, 0, ?)",
        )
        .bind(invoice.id)
        .bind(invoice.vehicle_id)
        .bind(invoice.amount)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_invoice(invoice.id).await.map(Some)
    }

    /// Get an invoice by ID.
    pub async fn get_invoice(&self, id: &str) -> Result<PaymentInvoice, DatabaseError> {
        sqlx::query_as::<_, PaymentInvoice>("SELECT * FROM payment_invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Invoice {id}")))
    }

    /// List the invoices raised for a vehicle, oldest first.
    pub async fn list_invoices(&self, vehicle_id: &str) -> Result<Vec<PaymentInvoice>, DatabaseError> {
        let invoices = sqlx::query_as::<_, PaymentInvoice>(
            "SELECT * FROM payment_invoices WHERE vehicle_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(vehicle_id)
        .fetch_all(self.pool())
        .await?;

        Ok(invoices)
    }

    /// Mark an unpaid invoice paid and complete its vehicle's case in one
    /// transaction.
    ///
    /// Returns `false` and writes nothing if the invoice is missing or
    /// already paid.
    pub async fn settle_invoice(
        &self,
        id: &str,
        trace_id: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        let paid = sqlx::query(
            "UPDATE payment_invoices SET is_paid = 1, paid_at = ?, gateway_trace_id = ? WHERE id = ? AND is_paid = 0",
        )
        .bind(now)
        .bind(trace_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if paid.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE vehicles SET status = ?, updated_at = ? WHERE id = (SELECT vehicle_id FROM payment_invoices WHERE id = ?)",
        )
        .bind(CaseStatus::Completed.as_str())
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    // =========================================================================
    // Comment queries
    // =========================================================================

    /// Attach a comment to a vehicle's case.
    pub async fn create_comment(&self, comment: &NewComment<'_>) -> Result<Comment, DatabaseError> {
        sqlx::query(
            "INSERT INTO comments (id, vehicle_id, author_id, content, is_from_company, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.id)
        .bind(comment.vehicle_id)
        .bind(comment.author_id)
        .bind(comment.content)
        .bind(i64::from(comment.is_from_company))
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(comment.id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Comment {}", comment.id)))
    }

    /// List a case's comments in chronological order.
    pub async fn list_comments(&self, vehicle_id: &str) -> Result<Vec<Comment>, DatabaseError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE vehicle_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(vehicle_id)
        .fetch_all(self.pool())
        .await?;

        Ok(comments)
    }
}
