pub mod allocation_service;
pub mod balance_service;
pub mod cash_flow_service;
pub mod line_item_service;
pub mod payment_service;
pub mod vendor_service;

pub use allocation_service::{AllocationInstruction, AllocationPlan, AllocationService};
pub use balance_service::{BalanceService, BalanceSheet, VendorBalance};
pub use cash_flow_service::{CashFlowService, CashFlowSummary, CollectionEntry, CollectionKind};
pub use line_item_service::LineItemService;
pub use payment_service::{NewPayment, PaymentService};
pub use vendor_service::{VendorRemoval, VendorService};

use std::fmt;

use uuid::Uuid;

use crate::domain::Payment;
use crate::errors::LedgerError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(LedgerError),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error(transparent)]
    PartialAllocation(#[from] PartialAllocationFailure),
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound { table, id } => ServiceError::NotFound {
                entity: table.entity_name(),
                id,
            },
            other => ServiceError::Ledger(other),
        }
    }
}

/// A vendor allocation whose payment insert failed.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedAllocation {
    pub instruction: AllocationInstruction,
    pub reason: String,
}

/// Some per-vendor payment inserts of a bulk allocation failed while others were stored.
///
/// Stored payments are left in place; `failed` lists what needs to be retried or
/// reconciled by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialAllocationFailure {
    pub succeeded: Vec<Payment>,
    pub failed: Vec<FailedAllocation>,
}

impl PartialAllocationFailure {
    pub fn failed_vendor_ids(&self) -> Vec<Uuid> {
        self.failed
            .iter()
            .map(|failure| failure.instruction.vendor_id)
            .collect()
    }

    pub fn unpaid_amount(&self) -> f64 {
        self.failed
            .iter()
            .map(|failure| failure.instruction.amount)
            .sum()
    }
}

impl fmt::Display for PartialAllocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} vendor allocations failed (",
            self.failed.len(),
            self.failed.len() + self.succeeded.len()
        )?;
        for (index, failure) in self.failed.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(
                f,
                "{} {:.2} to {}: {}",
                failure.instruction.vendor_name,
                failure.instruction.amount,
                failure.instruction.vendor_id,
                failure.reason
            )?;
        }
        f.write_str(")")
    }
}

impl std::error::Error for PartialAllocationFailure {}

pub(crate) fn require_positive_amount(amount: f64) -> ServiceResult<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "amount must be a positive number, got {amount}"
        )))
    }
}

pub(crate) fn require_text<'a>(value: Option<&'a str>, field: &str) -> ServiceResult<&'a str> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ServiceError::Validation(format!("{field} is required")))
}
