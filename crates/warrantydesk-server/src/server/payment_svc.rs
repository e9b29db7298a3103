//! Payment requests and gateway verification.
//!
//! Raising a payment request moves a case to `AwaitingPayment`; a
//! successful gateway callback settles the invoice and completes the case.
//! A failed callback changes nothing, and the owner may request payment
//! again.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use warrantydesk_core::{CaseStatus, FeeInput, FeePolicy};

use super::error::ServiceError;
use super::vehicle_svc::owned_vehicle;
use crate::storage::{Database, DatabaseError, NewInvoice, PaymentInvoice};

/// Produces the URL a browser is sent to in order to pay an invoice.
pub trait PaymentGateway: Send + Sync {
    fn redirect_url(&self, invoice: &PaymentInvoice) -> String;
}

/// Gateway stand-in that immediately reports success back to this
/// server's own callback.
#[derive(Debug, Clone)]
pub struct MockGateway {
    public_base_url: String,
}

impl MockGateway {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl PaymentGateway for MockGateway {
    fn redirect_url(&self, invoice: &PaymentInvoice) -> String {
        format!(
            "{}/api/payment/callback?invoiceId={}&isSuccess=true&traceId=MOCK_{}",
            self.public_base_url,
            invoice.id,
            uuid::Uuid::new_v4().simple()
        )
    }
}

/// A freshly opened invoice and where to send the browser to pay it.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub invoice: PaymentInvoice,
    pub redirect_url: String,
}

pub struct PaymentService {
    db: Database,
    fee: Arc<dyn FeePolicy>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(db: Database, fee: Arc<dyn FeePolicy>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { db, fee, gateway }
    }

    /// Open an invoice for one of the caller's vehicles.
    ///
    /// Absent or foreign vehicles are `AccessDenied`; closed cases are a
    /// `Conflict`. Neither writes anything.
    #[instrument(skip(self), fields(op = "create_payment_request"))]
    pub async fn create_payment_request(
        &self,
        vehicle_id: &str,
        user_id: &str,
    ) -> Result<PaymentRequest, ServiceError> {
        let Some(vehicle) = owned_vehicle(&self.db, vehicle_id, user_id).await? else {
            warn!(vehicle_id = %vehicle_id, user_id = %user_id, "Payment request for unowned vehicle");
            return Err(ServiceError::AccessDenied);
        };

        let status = vehicle
            .case_status()
            .map_err(|e| ServiceError::internal("Stored case status", e))?;
        if !status.can_transition_to(CaseStatus::AwaitingPayment) {
            return Err(ServiceError::Conflict(format!(
                "Case is {status} and cannot accept payment"
            )));
        }

        let amount = self.fee.amount_for(FeeInput {
            model_name: &vehicle.model_name,
            production_year: vehicle.production_year,
        });

        let invoice_id = uuid::Uuid::new_v4().to_string();
        let Some(invoice) = self
            .db
            .open_payment_request(
                &NewInvoice {
                    id: &invoice_id,
                    vehicle_id: &vehicle.id,
                    amount,
                },
                status,
            )
            .await?
        else {
            warn!(vehicle_id = %vehicle.id, "Case status changed during payment request");
            return Err(ServiceError::Conflict(
                "Case status changed, please retry".to_string(),
            ));
        };

        info!(vehicle_id = %vehicle.id, invoice_id = %invoice.id, amount, "Payment requested");

        let redirect_url = self.gateway.redirect_url(&invoice);
        Ok(PaymentRequest {
            invoice,
            redirect_url,
        })
    }

    /// Apply a gateway callback. Returns whether the invoice was settled.
    ///
    /// Unknown invoices, already-paid invoices and failed payments all
    /// return `false` and leave the store untouched.
    #[instrument(skip(self), fields(op = "verify_payment"))]
    pub async fn verify_payment(
        &self,
        invoice_id: &str,
        success: bool,
        trace_id: Option<&str>,
    ) -> Result<bool, ServiceError> {
        let invoice = match self.db.get_invoice(invoice_id).await {
            Ok(invoice) => invoice,
            Err(DatabaseError::NotFound(_)) => {
                warn!(invoice_id = %invoice_id, "Callback for unknown invoice");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        if invoice.is_paid() {
            warn!(invoice_id = %invoice_id, "Callback for already-paid invoice");
            return Ok(false);
        }

        if !success {
            info!(invoice_id = %invoice_id, "Gateway reported failed payment");
            return Ok(false);
        }

        let settled = self.db.settle_invoice(invoice_id, trace_id).await?;
        if settled {
            info!(invoice_id = %invoice_id, vehicle_id = %invoice.vehicle_id, "Payment verified");
        }
        Ok(settled)
    }
}
