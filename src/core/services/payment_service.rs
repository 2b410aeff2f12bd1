//! Validated create, update and delete of individual payment records.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::domain::{Payment, PaymentKind};
use crate::storage::{self, Direction, Query, Record, RecordStore};

use super::{require_positive_amount, require_text, ServiceError, ServiceResult};

/// Input for recording a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub kind: PaymentKind,
    pub amount: f64,
    pub narration: Option<String>,
    pub vendor_id: Option<Uuid>,
}

impl NewPayment {
    pub fn participant(vendor_id: Uuid, amount: f64) -> Self {
        Self {
            kind: PaymentKind::Participant,
            amount,
            narration: None,
            vendor_id: Some(vendor_id),
        }
    }

    pub fn other(narration: impl Into<String>, amount: f64) -> Self {
        Self {
            kind: PaymentKind::Other,
            amount,
            narration: Some(narration.into()),
            vendor_id: None,
        }
    }

    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }

    fn into_payment(self) -> ServiceResult<Payment> {
        require_positive_amount(self.amount)?;
        match self.kind {
            PaymentKind::Participant => {
                let vendor_id = self.vendor_id.ok_or_else(|| {
                    ServiceError::Validation("participant payments need a vendor".into())
                })?;
                let narration = self
                    .narration
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty());
                Ok(Payment::participant(vendor_id, self.amount, narration))
            }
            PaymentKind::Other => {
                if self.vendor_id.is_some() {
                    return Err(ServiceError::Validation(
                        "other payments cannot reference a vendor".into(),
                    ));
                }
                let narration = require_text(self.narration.as_deref(), "narration")?;
                Ok(Payment::other(narration, self.amount))
            }
        }
    }
}

pub struct PaymentService;

impl PaymentService {
    pub async fn create(store: &dyn RecordStore, payment: NewPayment) -> ServiceResult<Payment> {
        let payment = payment.into_payment()?;
        let stored = storage::insert_record(store, &payment).await?;
        tracing::info!(
            payment_id = %stored.id,
            kind = ?stored.kind,
            vendor_id = ?stored.vendor_id,
            amount = stored.amount,
            "payment recorded"
        );
        Ok(stored)
    }

    /// Changes narration and amount of an `other` payment.
    ///
    /// Participant payments come from allocations and are deleted and re-allocated instead.
    pub async fn update(
        store: &dyn RecordStore,
        id: Uuid,
        narration: &str,
        amount: f64,
    ) -> ServiceResult<Payment> {
        let existing: Payment = storage::fetch_one(store, id).await?;
        if existing.kind != PaymentKind::Other {
            return Err(ServiceError::Validation(format!(
                "payment {id} settles a vendor and cannot be edited"
            )));
        }
        let narration = require_text(Some(narration), "narration")?;
        require_positive_amount(amount)?;

        let mut changes = Map::new();
        changes.insert("narration".into(), Value::String(narration.to_string()));
        changes.insert("amount".into(), json!(amount));
        let updated: Payment = storage::update_record(store, id, changes).await?;
        tracing::info!(payment_id = %id, amount, "payment updated");
        Ok(updated)
    }

    /// Removes a payment, returning whether it existed. Deleting an unknown id is a no-op.
    ///
    /// Balances and cash flow must be recomputed by the caller.
    pub async fn delete(store: &dyn RecordStore, id: Uuid) -> ServiceResult<bool> {
        let query = Query::all().eq("id", id.to_string());
        let removed = store.delete_where(Payment::TABLE, &query).await? > 0;
        if removed {
            tracing::info!(payment_id = %id, "payment deleted");
        } else {
            tracing::debug!(payment_id = %id, "payment already absent");
        }
        Ok(removed)
    }

    /// Payments newest first, optionally restricted to one kind.
    pub async fn list(
        store: &dyn RecordStore,
        kind: Option<PaymentKind>,
    ) -> ServiceResult<Vec<Payment>> {
        let mut query = Query::all().order_by("created_at", Direction::Descending);
        if let Some(kind) = kind {
            query = query.eq("payment_type", kind.as_str());
        }
        Ok(storage::fetch(store, &query).await?)
    }
}
