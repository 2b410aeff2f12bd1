use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commission::PriceTriple;

/// A product sold at a vendor's counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub item_name: String,
    pub cost_price: f64,
    pub selling_price: f64,
    /// Percentage of the selling price retained by the organiser.
    pub commission_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    pub fn new(vendor_id: Uuid, item_name: impl Into<String>, prices: PriceTriple) -> Self {
        Self {
            id: Uuid::new_v4(),
            vendor_id,
            item_name: item_name.into(),
            cost_price: prices.cost_price,
            selling_price: prices.selling_price,
            commission_rate: prices.commission_rate,
            created_at: Utc::now(),
        }
    }

    pub fn prices(&self) -> PriceTriple {
        PriceTriple {
            cost_price: self.cost_price,
            selling_price: self.selling_price,
            commission_rate: self.commission_rate,
        }
    }
}
