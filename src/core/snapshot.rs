//! Point-in-time view of every record set and the figures derived from it.
//!
//! Balances and cash flow are never stored; they are recomputed from a fresh
//! snapshot after any change to bills, payments, registrations or vendors.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::core::services::{
    BalanceService, BalanceSheet, CashFlowService, CashFlowSummary, CollectionEntry,
};
use crate::domain::{BillingTransaction, Payment, Registration, Vendor};
use crate::storage::{self, RecordStore};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSnapshot {
    pub vendors: Vec<Vendor>,
    pub billing_transactions: Vec<BillingTransaction>,
    pub payments: Vec<Payment>,
    pub registrations: Vec<Registration>,
}

impl RecordSnapshot {
    /// Fetches all four record sets concurrently.
    pub async fn load(store: &dyn RecordStore) -> storage::Result<Self> {
        let (vendors, billing_transactions, payments, registrations) = tokio::try_join!(
            storage::fetch_all::<Vendor>(store),
            storage::fetch_all::<BillingTransaction>(store),
            storage::fetch_all::<Payment>(store),
            storage::fetch_all::<Registration>(store),
        )?;
        tracing::debug!(
            vendors = vendors.len(),
            billing_transactions = billing_transactions.len(),
            payments = payments.len(),
            registrations = registrations.len(),
            "snapshot loaded"
        );
        Ok(Self {
            vendors,
            billing_transactions,
            payments,
            registrations,
        })
    }

    pub fn collections(&self) -> Vec<CollectionEntry> {
        CashFlowService::collections(
            &self.vendors,
            &self.billing_transactions,
            &self.registrations,
        )
    }
}

/// Vendor balances and global cash flow for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub balances: BalanceSheet,
    pub cash_flow: CashFlowSummary,
}

impl Reconciliation {
    pub fn compute(snapshot: &RecordSnapshot, config: &EngineConfig) -> Self {
        let balances = BalanceService::compute(
            &snapshot.vendors,
            &snapshot.billing_transactions,
            &snapshot.payments,
            config.default_commission_rate,
        );
        let cash_flow = CashFlowService::summarize(
            &snapshot.vendors,
            &snapshot.billing_transactions,
            &snapshot.registrations,
            &snapshot.payments,
        );
        Self {
            balances,
            cash_flow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BillingEntry, RegistrationType};
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn load_reads_every_table() {
        let store = MemoryStore::new();
        let vendor = storage::insert_record(&store, &Vendor::new("Tea", "Asha"))
            .await
            .unwrap();
        let bill = BillingTransaction::new(
            vendor.id,
            vec![BillingEntry::new(100.0, 2).with_commission_rate(10.0)],
        );
        storage::insert_record(&store, &bill).await.unwrap();
        storage::insert_record(&store, &Payment::participant(vendor.id, 50.0, None))
            .await
            .unwrap();
        storage::insert_record(
            &store,
            &Registration::new("Desk", RegistrationType::EmploymentRegistration, 20.0),
        )
        .await
        .unwrap();

        let snapshot = RecordSnapshot::load(&store).await.unwrap();
        assert_eq!(snapshot.vendors.len(), 1);
        assert_eq!(snapshot.collections().len(), 2);

        let reconciliation = Reconciliation::compute(&snapshot, &EngineConfig::default());
        assert!((reconciliation.balances.remaining(vendor.id) - 130.0).abs() < 1e-9);
        assert_eq!(reconciliation.cash_flow.total_collected, 220.0);
        assert_eq!(reconciliation.cash_flow.cash_balance, 170.0);
    }

    #[test]
    fn empty_snapshot_reconciles_to_zero() {
        let reconciliation =
            Reconciliation::compute(&RecordSnapshot::default(), &EngineConfig::default());
        assert!(reconciliation.balances.is_empty());
        assert_eq!(reconciliation.cash_flow, CashFlowSummary::default());
    }
}
