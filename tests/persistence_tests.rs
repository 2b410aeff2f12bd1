mod common;

use std::sync::Arc;

use common::{seed_vendor, setup_test_env};
use stall_ledger::core::ReconciliationEngine;
use stall_ledger::core::services::{ServiceError, VendorService};
use stall_ledger::storage::JsonStore;

#[tokio::test]
async fn reopened_store_reconciles_identically() {
    let (engine, config_manager) = setup_test_env().await;
    let a = seed_vendor(engine.store(), "A", 400.0).await;
    let b = seed_vendor(engine.store(), "B", 600.0).await;
    engine.allocate(&[a.id, b.id], 900.0).await.unwrap();
    engine.record_other_payment("Tents", 75.0).await.unwrap();
    let before = engine.reconcile().await.unwrap();

    let config = engine.config().clone();
    let store = JsonStore::open(config_manager.store_path(&config))
        .await
        .unwrap();
    let reopened = ReconciliationEngine::new(Arc::new(store), config);
    let after = reopened.reconcile().await.unwrap();

    assert_eq!(after.cash_flow, before.cash_flow);
    assert_eq!(after.balances.remaining(b.id), 100.0);
    assert_eq!(after.balances.len(), 2);
}

#[tokio::test]
async fn vendor_cascade_is_persisted() {
    let (engine, config_manager) = setup_test_env().await;
    let a = seed_vendor(engine.store(), "A", 400.0).await;
    let removal = VendorService::delete(engine.store(), a.id).await.unwrap();
    assert_eq!(removal.billing_transactions, 1);

    let config = engine.config().clone();
    let store = JsonStore::open(config_manager.store_path(&config))
        .await
        .unwrap();
    let snapshot = ReconciliationEngine::new(Arc::new(store), config)
        .snapshot()
        .await
        .unwrap();
    assert!(snapshot.vendors.is_empty());
    assert!(snapshot.billing_transactions.is_empty());

    let err = VendorService::delete(engine.store(), a.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}
