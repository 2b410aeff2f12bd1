use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Displayable;

/// A registered sales counter ("stall") participating in the event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vendor {
    pub id: Uuid,
    pub counter_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_number: Option<String>,
    pub owner_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    /// Flat one-time booking fee collected at registration.
    #[serde(default)]
    pub registration_fee: f64,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Vendor {
    /// Creates an unverified vendor without counter, contact or fee.
    pub fn new(counter_name: impl Into<String>, owner_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            counter_name: counter_name.into(),
            counter_number: None,
            owner_name: owner_name.into(),
            mobile: None,
            registration_fee: 0.0,
            is_verified: false,
            region_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_counter_number(mut self, counter_number: impl Into<String>) -> Self {
        self.counter_number = Some(counter_number.into());
        self
    }

    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = Some(mobile.into());
        self
    }

    pub fn with_registration_fee(mut self, fee: f64) -> Self {
        self.registration_fee = fee;
        self
    }

    pub fn with_region(mut self, region_id: Uuid) -> Self {
        self.region_id = Some(region_id);
        self
    }

    /// Counter number with surrounding whitespace removed; blank values count as absent.
    pub fn normalized_counter_number(&self) -> Option<&str> {
        normalize(self.counter_number.as_deref())
    }

    pub fn normalized_mobile(&self) -> Option<&str> {
        normalize(self.mobile.as_deref())
    }
}

fn normalize(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

impl Displayable for Vendor {
    fn display_label(&self) -> String {
        match self.normalized_counter_number() {
            Some(number) => format!("#{} - {}", number, self.counter_name),
            None => self.counter_name.clone(),
        }
    }
}
