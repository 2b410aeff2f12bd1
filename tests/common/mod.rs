#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use stall_ledger::{
    config::ConfigManager,
    core::ReconciliationEngine,
    domain::{BillingEntry, BillingTransaction, Vendor},
    storage::{self, JsonStore, RecordStore},
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates an engine over a JSON store in its own directory.
pub async fn setup_test_env() -> (ReconciliationEngine, ConfigManager) {
    let base = temp_base();
    let config_manager =
        ConfigManager::with_base_dir(base).expect("create config manager for temp dir");
    let config = config_manager.load().expect("load default config");
    let store = JsonStore::open(config_manager.store_path(&config))
        .await
        .expect("open json store");
    (
        ReconciliationEngine::new(Arc::new(store), config),
        config_manager,
    )
}

/// Inserts a vendor together with one zero-commission bill of `billed`.
pub async fn seed_vendor(store: &dyn RecordStore, name: &str, billed: f64) -> Vendor {
    let vendor = storage::insert_record(store, &Vendor::new(name, "Owner"))
        .await
        .expect("insert vendor");
    if billed > 0.0 {
        let bill = BillingTransaction::new(
            vendor.id,
            vec![BillingEntry::new(billed, 1).with_commission_rate(0.0)],
        );
        storage::insert_record(store, &bill)
            .await
            .expect("insert bill");
    }
    vendor
}
