use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a registration income record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationType {
    /// Mirrors a vendor's booking fee, which is already collected through [`Vendor`](super::Vendor).
    StallCounter,
    EmploymentBooking,
    EmploymentRegistration,
    #[serde(other)]
    Other,
}

impl RegistrationType {
    /// Whether records of this type contribute to the global collection totals.
    ///
    /// Stall counter registrations duplicate vendor registration fees and are excluded.
    pub fn counts_toward_collection(self) -> bool {
        !matches!(self, RegistrationType::StallCounter)
    }

    pub fn label(self) -> &'static str {
        match self {
            RegistrationType::StallCounter => "Stall Counter",
            RegistrationType::EmploymentBooking => "Employment Booking",
            RegistrationType::EmploymentRegistration => "Employment Registration",
            RegistrationType::Other => "Other Registration",
        }
    }
}

/// An income record from a registration desk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Registration {
    pub id: Uuid,
    pub name: String,
    pub registration_type: RegistrationType,
    #[serde(default)]
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(name: impl Into<String>, registration_type: RegistrationType, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            registration_type,
            amount,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_registration_types_map_to_other() {
        let parsed: RegistrationType = serde_json::from_str("\"volunteer\"").unwrap();
        assert_eq!(parsed, RegistrationType::Other);
        let counter: RegistrationType = serde_json::from_str("\"stall_counter\"").unwrap();
        assert_eq!(counter, RegistrationType::StallCounter);
    }

    #[test]
    fn only_stall_counter_is_excluded() {
        assert!(!RegistrationType::StallCounter.counts_toward_collection());
        assert!(RegistrationType::EmploymentBooking.counts_toward_collection());
        assert!(RegistrationType::EmploymentRegistration.counts_toward_collection());
        assert!(RegistrationType::Other.counts_toward_collection());
    }
}
