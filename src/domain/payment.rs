use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes vendor settlements from general expenses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Settlement directed at a specific vendor.
    Participant,
    /// Any other outgoing payment, described by its narration.
    Other,
}

impl PaymentKind {
    /// Column value as stored in the `payment_type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentKind::Participant => "participant",
            PaymentKind::Other => "other",
        }
    }
}

/// An outgoing payment recorded in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    #[serde(rename = "payment_type")]
    pub kind: PaymentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Uuid>,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn participant(vendor_id: Uuid, amount: f64, narration: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: PaymentKind::Participant,
            vendor_id: Some(vendor_id),
            amount,
            narration,
            created_at: Utc::now(),
        }
    }

    pub fn other(narration: impl Into<String>, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: PaymentKind::Other,
            vendor_id: None,
            amount,
            narration: Some(narration.into()),
            created_at: Utc::now(),
        }
    }

    /// True when this payment settles part of `vendor_id`'s balance.
    pub fn settles(&self, vendor_id: Uuid) -> bool {
        self.kind == PaymentKind::Participant && self.vendor_id == Some(vendor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_as_payment_type() {
        let payment = Payment::other("Sound system", 1500.0);
        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["payment_type"], "other");
        assert!(json.get("vendor_id").is_none());
    }

    #[test]
    fn only_participant_payments_settle_vendors() {
        let vendor = Uuid::new_v4();
        assert!(Payment::participant(vendor, 10.0, None).settles(vendor));
        assert!(!Payment::participant(Uuid::new_v4(), 10.0, None).settles(vendor));
        assert!(!Payment::other("Chairs", 10.0).settles(vendor));
    }
}
