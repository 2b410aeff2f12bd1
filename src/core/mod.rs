pub mod engine;
pub mod services;
pub mod snapshot;
pub mod utils;

pub use engine::ReconciliationEngine;
pub use snapshot::{Reconciliation, RecordSnapshot};
