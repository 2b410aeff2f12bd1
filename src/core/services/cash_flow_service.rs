//! Global collected and paid totals across every income and expense stream.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{BillingTransaction, Payment, PaymentKind, Registration, RegistrationType, Vendor};

/// Income and expense totals. `cash_balance` may be negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CashFlowSummary {
    pub total_billing_collected: f64,
    pub stall_booking_fees: f64,
    pub total_registration_collected: f64,
    pub total_collected: f64,
    pub stall_payments_total: f64,
    pub other_payments_total: f64,
    pub total_paid: f64,
    pub cash_balance: f64,
    /// Registration income per type; excluded types are absent.
    pub registration_subtotals: BTreeMap<RegistrationType, f64>,
}

impl CashFlowSummary {
    pub fn registration_subtotal(&self, registration_type: RegistrationType) -> f64 {
        self.registration_subtotals
            .get(&registration_type)
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollectionKind {
    Billing,
    StallBooking,
    Registration(RegistrationType),
}

impl CollectionKind {
    pub fn category(self) -> &'static str {
        match self {
            CollectionKind::Billing => "Stall Billing",
            CollectionKind::StallBooking => "Stall Booking Fee",
            CollectionKind::Registration(registration_type) => registration_type.label(),
        }
    }
}

/// One line of the merged income feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionEntry {
    pub source_id: Uuid,
    pub kind: CollectionKind,
    pub description: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
}

pub struct CashFlowService;

impl CashFlowService {
    pub fn summarize(
        vendors: &[Vendor],
        bills: &[BillingTransaction],
        registrations: &[Registration],
        payments: &[Payment],
    ) -> CashFlowSummary {
        let total_billing_collected: f64 = bills.iter().map(|bill| bill.total).sum();
        let stall_booking_fees: f64 = vendors.iter().map(|vendor| vendor.registration_fee).sum();

        let mut registration_subtotals = BTreeMap::new();
        for registration in registrations
            .iter()
            .filter(|registration| registration.registration_type.counts_toward_collection())
        {
            *registration_subtotals
                .entry(registration.registration_type)
                .or_insert(0.0) += registration.amount;
        }
        let total_registration_collected: f64 = registration_subtotals.values().sum();
        let total_collected =
            total_billing_collected + stall_booking_fees + total_registration_collected;

        let paid_by_kind = |kind: PaymentKind| -> f64 {
            payments
                .iter()
                .filter(|payment| payment.kind == kind)
                .map(|payment| payment.amount)
                .sum()
        };
        let stall_payments_total = paid_by_kind(PaymentKind::Participant);
        let other_payments_total = paid_by_kind(PaymentKind::Other);
        let total_paid = stall_payments_total + other_payments_total;

        CashFlowSummary {
            total_billing_collected,
            stall_booking_fees,
            total_registration_collected,
            total_collected,
            stall_payments_total,
            other_payments_total,
            total_paid,
            cash_balance: total_collected - total_paid,
            registration_subtotals,
        }
    }

    /// Every counted income record, newest first.
    pub fn collections(
        vendors: &[Vendor],
        bills: &[BillingTransaction],
        registrations: &[Registration],
    ) -> Vec<CollectionEntry> {
        let names: HashMap<Uuid, &str> = vendors
            .iter()
            .map(|vendor| (vendor.id, vendor.counter_name.as_str()))
            .collect();

        let billing = bills.iter().map(|bill| CollectionEntry {
            source_id: bill.id,
            kind: CollectionKind::Billing,
            description: names
                .get(&bill.vendor_id)
                .copied()
                .unwrap_or("Unknown Stall")
                .to_string(),
            amount: bill.total,
            date: bill.created_at,
        });
        let bookings = vendors
            .iter()
            .filter(|vendor| vendor.registration_fee > 0.0)
            .map(|vendor| CollectionEntry {
                source_id: vendor.id,
                kind: CollectionKind::StallBooking,
                description: vendor.counter_name.clone(),
                amount: vendor.registration_fee,
                date: vendor.created_at,
            });
        let desk = registrations
            .iter()
            .filter(|registration| registration.registration_type.counts_toward_collection())
            .map(|registration| CollectionEntry {
                source_id: registration.id,
                kind: CollectionKind::Registration(registration.registration_type),
                description: registration.name.clone(),
                amount: registration.amount,
                date: registration.created_at,
            });

        let mut entries: Vec<CollectionEntry> = billing.chain(bookings).chain(desk).collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BillingEntry;
    use chrono::Duration;

    #[test]
    fn stall_counter_registrations_are_excluded() {
        let registrations = vec![
            Registration::new("Counter 4", RegistrationType::StallCounter, 250.0),
            Registration::new("Job fair", RegistrationType::EmploymentBooking, 100.0),
            Registration::new("Walk-in", RegistrationType::EmploymentRegistration, 40.0),
            Registration::new("Walk-in 2", RegistrationType::EmploymentRegistration, 60.0),
        ];
        let summary = CashFlowService::summarize(&[], &[], &registrations, &[]);
        assert_eq!(summary.total_registration_collected, 200.0);
        assert_eq!(summary.total_collected, 200.0);
        assert_eq!(
            summary.registration_subtotal(RegistrationType::EmploymentRegistration),
            100.0
        );
        assert_eq!(summary.registration_subtotal(RegistrationType::StallCounter), 0.0);
    }

    #[test]
    fn totals_combine_every_stream() {
        let vendor = Vendor::new("Tea", "Asha").with_registration_fee(500.0);
        let bills = vec![BillingTransaction::new(
            vendor.id,
            vec![BillingEntry::new(120.0, 5)],
        )];
        let registrations = vec![Registration::new(
            "Booking",
            RegistrationType::EmploymentBooking,
            75.0,
        )];
        let payments = vec![
            Payment::participant(vendor.id, 300.0, None),
            Payment::other("Stage", 1000.0),
        ];

        let summary = CashFlowService::summarize(&[vendor], &bills, &registrations, &payments);
        assert_eq!(summary.total_billing_collected, 600.0);
        assert_eq!(summary.stall_booking_fees, 500.0);
        assert_eq!(summary.total_collected, 1175.0);
        assert_eq!(summary.stall_payments_total, 300.0);
        assert_eq!(summary.other_payments_total, 1000.0);
        assert_eq!(summary.total_paid, 1300.0);
        assert_eq!(summary.cash_balance, -125.0);
        assert_eq!(
            summary.cash_balance,
            summary.total_collected - summary.total_paid
        );
    }

    #[test]
    fn empty_inputs_yield_zero_summary() {
        let summary = CashFlowService::summarize(&[], &[], &[], &[]);
        assert_eq!(summary, CashFlowSummary::default());
    }

    #[test]
    fn collections_are_newest_first_and_skip_free_bookings() {
        let now = Utc::now();
        let mut paid_booking = Vendor::new("Paid", "a").with_registration_fee(100.0);
        paid_booking.created_at = now - Duration::hours(3);
        let free_booking = Vendor::new("Free", "b");
        let mut bill = BillingTransaction::new(paid_booking.id, vec![BillingEntry::new(10.0, 1)]);
        bill.created_at = now - Duration::hours(1);
        let mut orphan_bill = BillingTransaction::new(Uuid::new_v4(), vec![BillingEntry::new(5.0, 1)]);
        orphan_bill.created_at = now - Duration::hours(2);
        let mut counter = Registration::new("Counter", RegistrationType::StallCounter, 250.0);
        counter.created_at = now;
        let mut booking = Registration::new("Job", RegistrationType::EmploymentBooking, 30.0);
        booking.created_at = now - Duration::minutes(5);

        let entries = CashFlowService::collections(
            &[paid_booking.clone(), free_booking],
            &[bill, orphan_bill],
            &[counter, booking],
        );
        let kinds: Vec<CollectionKind> = entries.iter().map(|entry| entry.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CollectionKind::Registration(RegistrationType::EmploymentBooking),
                CollectionKind::Billing,
                CollectionKind::Billing,
                CollectionKind::StallBooking,
            ]
        );
        assert_eq!(entries[1].description, "Paid");
        assert_eq!(entries[2].description, "Unknown Stall");
        assert_eq!(entries[0].kind.category(), "Employment Booking");
    }
}
