//! Plain records exchanged with the store and consumed by the reconciliation services.

pub mod billing;
pub mod common;
pub mod line_item;
pub mod payment;
pub mod registration;
pub mod vendor;

pub use billing::{BillingEntry, BillingTransaction};
pub use common::Displayable;
pub use line_item::LineItem;
pub use payment::{Payment, PaymentKind};
pub use registration::{Registration, RegistrationType};
pub use vendor::Vendor;
