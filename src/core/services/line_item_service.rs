use serde_json::{json, Map};
use uuid::Uuid;

use crate::commission::PriceTriple;
use crate::domain::{LineItem, Vendor};
use crate::storage::{self, Direction, Query, Record, RecordStore};

use super::{require_text, ServiceError, ServiceResult};

pub struct LineItemService;

impl LineItemService {
    pub async fn add(
        store: &dyn RecordStore,
        vendor_id: Uuid,
        item_name: &str,
        prices: PriceTriple,
        tolerance: f64,
    ) -> ServiceResult<LineItem> {
        let item_name = require_text(Some(item_name), "item name")?;
        Self::validate_prices(&prices, tolerance)?;
        storage::fetch_one::<Vendor>(store, vendor_id).await?;

        let item = LineItem::new(vendor_id, item_name, prices);
        let stored = storage::insert_record(store, &item).await?;
        tracing::debug!(item_id = %stored.id, vendor_id = %vendor_id, "line item added");
        Ok(stored)
    }

    pub async fn edit(
        store: &dyn RecordStore,
        id: Uuid,
        item_name: &str,
        prices: PriceTriple,
        tolerance: f64,
    ) -> ServiceResult<LineItem> {
        let item_name = require_text(Some(item_name), "item name")?;
        Self::validate_prices(&prices, tolerance)?;

        let mut fields = Map::new();
        fields.insert("item_name".into(), json!(item_name));
        fields.insert("cost_price".into(), json!(prices.cost_price));
        fields.insert("selling_price".into(), json!(prices.selling_price));
        fields.insert("commission_rate".into(), json!(prices.commission_rate));
        let updated: LineItem = storage::update_record(store, id, fields).await?;
        tracing::debug!(item_id = %id, "line item updated");
        Ok(updated)
    }

    pub async fn delete(store: &dyn RecordStore, id: Uuid) -> ServiceResult<()> {
        store.delete(LineItem::TABLE, id).await?;
        tracing::debug!(item_id = %id, "line item deleted");
        Ok(())
    }

    pub async fn list_for_vendor(
        store: &dyn RecordStore,
        vendor_id: Uuid,
    ) -> ServiceResult<Vec<LineItem>> {
        let query = Query::all()
            .eq("vendor_id", vendor_id.to_string())
            .order_by("item_name", Direction::Ascending);
        Ok(storage::fetch(store, &query).await?)
    }

    fn validate_prices(prices: &PriceTriple, tolerance: f64) -> ServiceResult<()> {
        prices
            .validate(tolerance)
            .map_err(|err| ServiceError::Validation(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const TOLERANCE: f64 = 0.005;

    async fn vendor(store: &MemoryStore) -> Vendor {
        storage::insert_record(store, &Vendor::new("Tea Corner", "Asha"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_requires_known_vendor_and_consistent_prices() {
        let store = MemoryStore::new();
        let owner = vendor(&store).await;
        let prices = PriceTriple::from_cost(80.0, 20.0).unwrap();

        let item = LineItemService::add(&store, owner.id, " Masala chai ", prices, TOLERANCE)
            .await
            .unwrap();
        assert_eq!(item.item_name, "Masala chai");
        assert!((item.selling_price - 100.0).abs() < 1e-9);

        let err = LineItemService::add(&store, Uuid::new_v4(), "Chai", prices, TOLERANCE)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "vendor", .. }));

        let skewed = PriceTriple {
            cost_price: 80.0,
            selling_price: 120.0,
            commission_rate: 20.0,
        };
        let err = LineItemService::add(&store, owner.id, "Chai", skewed, TOLERANCE)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn edit_and_delete_round_out_the_catalogue() {
        let store = MemoryStore::new();
        let owner = vendor(&store).await;
        let item = LineItemService::add(
            &store,
            owner.id,
            "Samosa",
            PriceTriple::from_prices(15.0, 20.0).unwrap(),
            TOLERANCE,
        )
        .await
        .unwrap();
        LineItemService::add(
            &store,
            owner.id,
            "Bun",
            PriceTriple::from_cost(8.0, 20.0).unwrap(),
            TOLERANCE,
        )
        .await
        .unwrap();

        let edited = LineItemService::edit(
            &store,
            item.id,
            "Samosa (2 pc)",
            PriceTriple::from_prices(30.0, 40.0).unwrap(),
            TOLERANCE,
        )
        .await
        .unwrap();
        assert!((edited.commission_rate - 25.0).abs() < 1e-9);

        let names: Vec<String> = LineItemService::list_for_vendor(&store, owner.id)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.item_name)
            .collect();
        assert_eq!(names, vec!["Bun", "Samosa (2 pc)"]);

        LineItemService::delete(&store, item.id).await.unwrap();
        assert_eq!(store.row_count(LineItem::TABLE).await, 1);
    }
}
