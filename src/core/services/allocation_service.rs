//! Splits one bulk payment across selected vendors and records the per-vendor payments.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Payment, Vendor};
use crate::storage::RecordStore;

use super::{
    require_positive_amount, BalanceSheet, FailedAllocation, NewPayment,
    PartialAllocationFailure, PaymentService, ServiceError, ServiceResult,
};

/// Shares at or below this are floating-point residue, not money.
const RESIDUE: f64 = 1e-9;

const UNKNOWN_VENDOR: &str = "Unknown";

/// A single vendor payment to be recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationInstruction {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub amount: f64,
    pub narration: String,
}

/// The outcome of splitting a requested amount; nothing has been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationPlan {
    pub requested: f64,
    pub total_pending: f64,
    pub instructions: Vec<AllocationInstruction>,
}

impl AllocationPlan {
    pub fn allocated_total(&self) -> f64 {
        self.instructions
            .iter()
            .map(|instruction| instruction.amount)
            .sum()
    }
}

pub struct AllocationService;

impl AllocationService {
    /// Fills vendors in selection order until `requested` is used up.
    ///
    /// Earlier vendors are paid in full before later ones receive anything; this is
    /// a sequential fill, not a ratio split. Vendors with nothing pending are skipped
    /// and repeated ids only count once. Requests above the selection's total
    /// pending balance are rejected without producing instructions; only
    /// floating-point residue is allowed over the limit.
    pub fn plan(
        selection: &[Uuid],
        requested: f64,
        sheet: &BalanceSheet,
        vendors: &[Vendor],
    ) -> ServiceResult<AllocationPlan> {
        if selection.is_empty() {
            return Err(ServiceError::Validation(
                "select at least one vendor".into(),
            ));
        }
        require_positive_amount(requested)?;

        let mut seen = HashSet::new();
        let selection: Vec<Uuid> = selection
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        let total_pending = sheet.total_pending(&selection);
        if requested - total_pending > RESIDUE {
            return Err(ServiceError::Validation(format!(
                "requested {requested:.2} exceeds total pending {total_pending:.2}"
            )));
        }

        let names: HashMap<Uuid, &str> = vendors
            .iter()
            .map(|vendor| (vendor.id, vendor.counter_name.as_str()))
            .collect();
        let mut remaining = requested;
        let mut instructions = Vec::new();
        for vendor_id in selection {
            let pending = sheet.remaining(vendor_id);
            if pending <= 0.0 {
                continue;
            }
            let share = pending.min(remaining);
            if share <= RESIDUE {
                break;
            }
            let vendor_name = names
                .get(&vendor_id)
                .copied()
                .unwrap_or(UNKNOWN_VENDOR)
                .to_string();
            instructions.push(AllocationInstruction {
                vendor_id,
                narration: format!("Payment to {vendor_name}"),
                vendor_name,
                amount: share,
            });
            remaining -= share;
        }

        tracing::debug!(
            requested,
            total_pending,
            vendors = instructions.len(),
            "allocation planned"
        );
        Ok(AllocationPlan {
            requested,
            total_pending,
            instructions,
        })
    }

    /// Records every instruction of `plan` as its own payment, concurrently.
    ///
    /// All inserts are awaited. If any fail, the ones that succeeded stay stored
    /// and a [`PartialAllocationFailure`] describes both sides.
    pub async fn execute(
        store: &dyn RecordStore,
        plan: &AllocationPlan,
    ) -> ServiceResult<Vec<Payment>> {
        let inserts = plan.instructions.iter().map(|instruction| async move {
            let payment = NewPayment::participant(instruction.vendor_id, instruction.amount)
                .with_narration(instruction.narration.clone());
            (instruction, PaymentService::create(store, payment).await)
        });

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (instruction, outcome) in join_all(inserts).await {
            match outcome {
                Ok(payment) => succeeded.push(payment),
                Err(err) => {
                    tracing::warn!(
                        vendor_id = %instruction.vendor_id,
                        amount = instruction.amount,
                        error = %err,
                        "vendor allocation failed"
                    );
                    failed.push(FailedAllocation {
                        instruction: instruction.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        if failed.is_empty() {
            tracing::info!(
                vendors = succeeded.len(),
                amount = plan.allocated_total(),
                "bulk payment distributed"
            );
            Ok(succeeded)
        } else {
            Err(PartialAllocationFailure { succeeded, failed }.into())
        }
    }

    /// Plans and executes a bulk payment in one step.
    pub async fn allocate(
        store: &dyn RecordStore,
        selection: &[Uuid],
        requested: f64,
        sheet: &BalanceSheet,
        vendors: &[Vendor],
    ) -> ServiceResult<Vec<Payment>> {
        let plan = Self::plan(selection, requested, sheet, vendors)?;
        Self::execute(store, &plan).await
    }
}
