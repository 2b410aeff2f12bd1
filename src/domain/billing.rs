use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a recorded sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "BillingEntry::default_quantity")]
    pub quantity: u32,
    /// Commission rate in force when the sale was rung up. Absent on older bills.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
}

impl BillingEntry {
    pub fn new(price: f64, quantity: u32) -> Self {
        Self {
            item_id: None,
            price,
            quantity,
            commission_rate: None,
        }
    }

    pub fn with_item(mut self, item_id: Uuid) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn with_commission_rate(mut self, rate: f64) -> Self {
        self.commission_rate = Some(rate);
        self
    }

    pub fn gross(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    /// Vendor's share of this line once the organiser's commission is deducted.
    pub fn vendor_share(&self, fallback_rate: f64) -> f64 {
        let rate = self.commission_rate.unwrap_or(fallback_rate);
        self.gross() * (1.0 - rate / 100.0)
    }

    fn default_quantity() -> u32 {
        1
    }
}

/// A sale event recorded against a vendor. Read-only from the engine's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingTransaction {
    pub id: Uuid,
    pub vendor_id: Uuid,
    #[serde(default)]
    pub entries: Vec<BillingEntry>,
    /// Gross sale amount as charged to the customer.
    #[serde(default)]
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

impl BillingTransaction {
    /// Builds a bill whose total is the gross of its entries.
    pub fn new(vendor_id: Uuid, entries: Vec<BillingEntry>) -> Self {
        let total = entries.iter().map(BillingEntry::gross).sum();
        Self {
            id: Uuid::new_v4(),
            vendor_id,
            entries,
            total,
            created_at: Utc::now(),
        }
    }

    pub fn vendor_share(&self, fallback_rate: f64) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.vendor_share(fallback_rate))
            .sum()
    }
}
