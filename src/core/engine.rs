use std::sync::Arc;

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::commission::PriceTriple;
use crate::core::services::{
    AllocationPlan, AllocationService, BalanceService, LineItemService, NewPayment,
    PaymentService, ServiceResult,
};
use crate::core::snapshot::{Reconciliation, RecordSnapshot};
use crate::domain::{LineItem, Payment};
use crate::storage::RecordStore;

/// Entry point tying a record store to the reconciliation services.
///
/// Every read recomputes from a fresh snapshot, so figures always reflect the
/// latest state of the store.
pub struct ReconciliationEngine {
    store: Arc<dyn RecordStore>,
    config: EngineConfig,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn RecordStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> ServiceResult<RecordSnapshot> {
        Ok(RecordSnapshot::load(self.store()).await?)
    }

    pub async fn reconcile(&self) -> ServiceResult<Reconciliation> {
        let snapshot = self.snapshot().await?;
        Ok(Reconciliation::compute(&snapshot, &self.config))
    }

    /// Works out the per-vendor split of `amount` without writing anything.
    pub async fn plan_allocation(
        &self,
        selection: &[Uuid],
        amount: f64,
    ) -> ServiceResult<AllocationPlan> {
        let snapshot = self.snapshot().await?;
        let sheet = BalanceService::compute(
            &snapshot.vendors,
            &snapshot.billing_transactions,
            &snapshot.payments,
            self.config.default_commission_rate,
        );
        AllocationService::plan(selection, amount, &sheet, &snapshot.vendors)
    }

    /// Splits `amount` over the selected vendors and records one payment per share.
    pub async fn allocate(&self, selection: &[Uuid], amount: f64) -> ServiceResult<Vec<Payment>> {
        let plan = self.plan_allocation(selection, amount).await?;
        AllocationService::execute(self.store(), &plan).await
    }

    pub async fn record_other_payment(
        &self,
        narration: &str,
        amount: f64,
    ) -> ServiceResult<Payment> {
        PaymentService::create(self.store(), NewPayment::other(narration, amount)).await
    }

    pub async fn update_other_payment(
        &self,
        id: Uuid,
        narration: &str,
        amount: f64,
    ) -> ServiceResult<Payment> {
        PaymentService::update(self.store(), id, narration, amount).await
    }

    /// Removes a payment if it exists; reports whether a row was removed.
    pub async fn delete_payment(&self, id: Uuid) -> ServiceResult<bool> {
        PaymentService::delete(self.store(), id).await
    }

    /// Adds a line item whose prices agree within the configured tolerance.
    pub async fn add_line_item(
        &self,
        vendor_id: Uuid,
        item_name: &str,
        prices: PriceTriple,
    ) -> ServiceResult<LineItem> {
        LineItemService::add(
            self.store(),
            vendor_id,
            item_name,
            prices,
            self.config.amount_tolerance,
        )
        .await
    }

    pub async fn edit_line_item(
        &self,
        id: Uuid,
        item_name: &str,
        prices: PriceTriple,
    ) -> ServiceResult<LineItem> {
        LineItemService::edit(
            self.store(),
            id,
            item_name,
            prices,
            self.config.amount_tolerance,
        )
        .await
    }
}
