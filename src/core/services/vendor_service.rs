use std::collections::HashSet;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::domain::{BillingTransaction, LineItem, Vendor};
use crate::storage::{self, Direction, Query, Record, RecordStore};

use super::{require_text, ServiceError, ServiceResult};

/// Rows removed together with a vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VendorRemoval {
    pub line_items: usize,
    pub billing_transactions: usize,
}

pub struct VendorService;

impl VendorService {
    pub async fn register(store: &dyn RecordStore, vendor: Vendor) -> ServiceResult<Vendor> {
        let vendor = Self::normalize(vendor)?;
        Self::ensure_unique(store, None, &vendor).await?;
        let stored = storage::insert_record(store, &vendor).await?;
        tracing::info!(vendor_id = %stored.id, counter = %stored.counter_name, "vendor registered");
        Ok(stored)
    }

    /// Replaces the editable fields of a vendor. Verification state and id are kept.
    pub async fn edit(store: &dyn RecordStore, id: Uuid, changes: Vendor) -> ServiceResult<Vendor> {
        storage::fetch_one::<Vendor>(store, id).await?;
        let changes = Self::normalize(changes)?;
        Self::ensure_unique(store, Some(id), &changes).await?;

        let mut fields = Map::new();
        fields.insert("counter_name".into(), json!(changes.counter_name));
        fields.insert("counter_number".into(), json!(changes.counter_number));
        fields.insert("owner_name".into(), json!(changes.owner_name));
        fields.insert("mobile".into(), json!(changes.mobile));
        fields.insert("registration_fee".into(), json!(changes.registration_fee));
        fields.insert("region_id".into(), json!(changes.region_id));
        let updated: Vendor = storage::update_record(store, id, fields).await?;
        tracing::info!(vendor_id = %id, "vendor updated");
        Ok(updated)
    }

    pub async fn verify(store: &dyn RecordStore, id: Uuid, verified: bool) -> ServiceResult<Vendor> {
        let mut fields = Map::new();
        fields.insert("is_verified".into(), Value::Bool(verified));
        let updated: Vendor = storage::update_record(store, id, fields).await?;
        tracing::info!(vendor_id = %id, verified, "vendor verification changed");
        Ok(updated)
    }

    pub async fn assign_counter(
        store: &dyn RecordStore,
        id: Uuid,
        counter_number: &str,
    ) -> ServiceResult<Vendor> {
        let counter_number = require_text(Some(counter_number), "counter number")?;
        let mut vendor: Vendor = storage::fetch_one(store, id).await?;
        vendor.counter_number = Some(counter_number.to_string());
        Self::ensure_unique(store, Some(id), &vendor).await?;

        let mut fields = Map::new();
        fields.insert("counter_number".into(), json!(counter_number));
        let updated: Vendor = storage::update_record(store, id, fields).await?;
        tracing::info!(vendor_id = %id, counter_number, "counter assigned");
        Ok(updated)
    }

    /// Removes the counter number of every listed vendor and returns how many were cleared.
    pub async fn clear_counters(store: &dyn RecordStore, ids: &[Uuid]) -> ServiceResult<usize> {
        let mut seen = HashSet::new();
        let mut cleared = 0;
        for id in ids.iter().copied().filter(|id| seen.insert(*id)) {
            let mut fields = Map::new();
            fields.insert("counter_number".into(), Value::Null);
            store.update(Vendor::TABLE, id, fields).await?;
            cleared += 1;
        }
        tracing::info!(cleared, "counter numbers cleared");
        Ok(cleared)
    }

    /// Deletes a vendor with its line items and billing transactions.
    ///
    /// Payments are kept so that cash already paid out stays in the cash flow.
    pub async fn delete(store: &dyn RecordStore, id: Uuid) -> ServiceResult<VendorRemoval> {
        storage::fetch_one::<Vendor>(store, id).await?;
        let owned = Query::all().eq("vendor_id", id.to_string());
        let removal = VendorRemoval {
            line_items: store.delete_where(LineItem::TABLE, &owned).await?,
            billing_transactions: store.delete_where(BillingTransaction::TABLE, &owned).await?,
        };
        store.delete(Vendor::TABLE, id).await?;
        tracing::info!(
            vendor_id = %id,
            line_items = removal.line_items,
            billing_transactions = removal.billing_transactions,
            "vendor deleted"
        );
        Ok(removal)
    }

    /// Vendors ordered by counter number; vendors without one come first.
    pub async fn list(store: &dyn RecordStore) -> ServiceResult<Vec<Vendor>> {
        let query = Query::all().order_by("counter_number", Direction::Ascending);
        Ok(storage::fetch(store, &query).await?)
    }

    fn normalize(mut vendor: Vendor) -> ServiceResult<Vendor> {
        vendor.counter_name = require_text(Some(&vendor.counter_name), "counter name")?.to_string();
        vendor.owner_name = require_text(Some(&vendor.owner_name), "owner name")?.to_string();
        vendor.counter_number = vendor.normalized_counter_number().map(str::to_string);
        vendor.mobile = vendor.normalized_mobile().map(str::to_string);
        if !(vendor.registration_fee.is_finite() && vendor.registration_fee >= 0.0) {
            return Err(ServiceError::Validation(format!(
                "registration fee cannot be negative, got {}",
                vendor.registration_fee
            )));
        }
        Ok(vendor)
    }

    async fn ensure_unique(
        store: &dyn RecordStore,
        exclude: Option<Uuid>,
        vendor: &Vendor,
    ) -> ServiceResult<()> {
        let checks = [
            ("counter_number", "Counter number", vendor.counter_number.as_deref()),
            ("mobile", "Mobile number", vendor.mobile.as_deref()),
        ];
        for (field, label, value) in checks {
            let Some(value) = value else {
                continue;
            };
            let rows = store
                .select(Vendor::TABLE, &Query::all().eq(field, value))
                .await?;
            let taken = rows
                .iter()
                .filter_map(storage::row_id)
                .any(|other| exclude.map_or(true, |id| other != id));
            if taken {
                return Err(ServiceError::Validation(format!(
                    "{label} `{value}` is already registered"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BillingEntry;
    use crate::storage::MemoryStore;

    async fn seeded(store: &MemoryStore) -> Vendor {
        VendorService::register(
            store,
            Vendor::new("Tea Corner", "Asha")
                .with_counter_number(" 7 ")
                .with_mobile("9000000001"),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn register_trims_and_starts_unverified() {
        let store = MemoryStore::new();
        let vendor = seeded(&store).await;
        assert_eq!(vendor.counter_number.as_deref(), Some("7"));
        assert!(!vendor.is_verified);
        assert_eq!(VendorService::list(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_bad_input() {
        let store = MemoryStore::new();
        seeded(&store).await;

        let candidates = [
            Vendor::new("Snacks", "Ravi").with_counter_number("7"),
            Vendor::new("Snacks", "Ravi").with_mobile(" 9000000001"),
            Vendor::new("  ", "Ravi"),
            Vendor::new("Snacks", ""),
            Vendor::new("Snacks", "Ravi").with_registration_fee(-1.0),
        ];
        for candidate in candidates {
            let err = VendorService::register(&store, candidate).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
        }
        assert_eq!(store.row_count(Vendor::TABLE).await, 1);
    }

    #[tokio::test]
    async fn edit_keeps_own_counter_and_can_clear_optional_fields() {
        let store = MemoryStore::new();
        let vendor = seeded(&store).await;
        VendorService::verify(&store, vendor.id, true).await.unwrap();

        let mut changes = vendor.clone();
        changes.owner_name = "Asha K".into();
        changes.mobile = None;
        let updated = VendorService::edit(&store, vendor.id, changes).await.unwrap();
        assert_eq!(updated.owner_name, "Asha K");
        assert_eq!(updated.counter_number.as_deref(), Some("7"));
        assert!(updated.mobile.is_none());
        assert!(updated.is_verified);
    }

    #[tokio::test]
    async fn counters_can_be_assigned_and_cleared() {
        let store = MemoryStore::new();
        let first = seeded(&store).await;
        let second = VendorService::register(&store, Vendor::new("Juice", "Mala"))
            .await
            .unwrap();

        let err = VendorService::assign_counter(&store, second.id, "7")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        VendorService::assign_counter(&store, second.id, " 8 ")
            .await
            .unwrap();

        let cleared = VendorService::clear_counters(&store, &[first.id, second.id, first.id])
            .await
            .unwrap();
        assert_eq!(cleared, 2);
        let vendors = VendorService::list(&store).await.unwrap();
        assert!(vendors.iter().all(|vendor| vendor.counter_number.is_none()));
    }

    #[tokio::test]
    async fn delete_cascades_to_items_and_bills() {
        let store = MemoryStore::new();
        let vendor = seeded(&store).await;
        let bill = BillingTransaction::new(vendor.id, vec![BillingEntry::new(50.0, 2)]);
        storage::insert_record(&store, &bill).await.unwrap();
        let other_bill = BillingTransaction::new(Uuid::new_v4(), vec![BillingEntry::new(5.0, 1)]);
        storage::insert_record(&store, &other_bill).await.unwrap();

        let removal = VendorService::delete(&store, vendor.id).await.unwrap();
        assert_eq!(
            removal,
            VendorRemoval {
                line_items: 0,
                billing_transactions: 1
            }
        );
        assert_eq!(store.row_count(Vendor::TABLE).await, 0);
        assert_eq!(store.row_count(BillingTransaction::TABLE).await, 1);

        let err = VendorService::delete(&store, vendor.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "vendor", .. }));
    }
}
