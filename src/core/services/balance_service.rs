//! Per-vendor settlement balances derived from bills and payments.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{BillingTransaction, Payment, Vendor};

/// What the organiser owes a single vendor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VendorBalance {
    pub vendor_id: Uuid,
    /// Gross sales, before commission.
    pub billed_amount: f64,
    /// Vendor's take-home after commission.
    pub bill_balance: f64,
    pub already_paid: f64,
    /// `bill_balance - already_paid`; negative when the vendor was overpaid.
    pub signed_balance: f64,
    /// `signed_balance` clamped at zero.
    pub remaining_balance: f64,
}

impl VendorBalance {
    fn new(vendor_id: Uuid, billed_amount: f64, bill_balance: f64, already_paid: f64) -> Self {
        let signed_balance = bill_balance - already_paid;
        Self {
            vendor_id,
            billed_amount,
            bill_balance,
            already_paid,
            signed_balance,
            remaining_balance: signed_balance.max(0.0),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.remaining_balance > 0.0
    }

    /// Amount paid beyond the bill balance.
    pub fn credit(&self) -> f64 {
        (-self.signed_balance).max(0.0)
    }
}

/// Balances for every vendor, kept in vendor order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BalanceSheet {
    balances: Vec<VendorBalance>,
    #[serde(skip)]
    index: HashMap<Uuid, usize>,
}

impl BalanceSheet {
    fn from_balances(balances: Vec<VendorBalance>) -> Self {
        let index = balances
            .iter()
            .enumerate()
            .map(|(position, balance)| (balance.vendor_id, position))
            .collect();
        Self { balances, index }
    }

    pub fn get(&self, vendor_id: Uuid) -> Option<&VendorBalance> {
        self.index
            .get(&vendor_id)
            .and_then(|position| self.balances.get(*position))
    }

    /// Remaining balance for `vendor_id`; unknown vendors owe nothing.
    pub fn remaining(&self, vendor_id: Uuid) -> f64 {
        self.get(vendor_id)
            .map_or(0.0, |balance| balance.remaining_balance)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VendorBalance> {
        self.balances.iter()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum of remaining balances over a selection, counting each vendor once.
    pub fn total_pending(&self, selection: &[Uuid]) -> f64 {
        let mut seen = HashSet::new();
        selection
            .iter()
            .filter(|id| seen.insert(**id))
            .map(|id| self.remaining(*id))
            .sum()
    }

    /// Vendors that are still owed money, in vendor order.
    pub fn vendors_with_pending(&self) -> Vec<Uuid> {
        self.balances
            .iter()
            .filter(|balance| balance.has_pending())
            .map(|balance| balance.vendor_id)
            .collect()
    }

    /// Vendors that received more than their bill balance.
    pub fn overpaid(&self) -> Vec<&VendorBalance> {
        self.balances
            .iter()
            .filter(|balance| balance.signed_balance < 0.0)
            .collect()
    }
}

pub struct BalanceService;

impl BalanceService {
    /// Derives one vendor's balance. `fallback_rate` applies to entries without a recorded commission.
    pub fn vendor_balance(
        vendor_id: Uuid,
        bills: &[BillingTransaction],
        payments: &[Payment],
        fallback_rate: f64,
    ) -> VendorBalance {
        let (billed_amount, bill_balance) = bills
            .iter()
            .filter(|bill| bill.vendor_id == vendor_id)
            .fold((0.0, 0.0), |(billed, take_home), bill| {
                (billed + bill.total, take_home + bill.vendor_share(fallback_rate))
            });
        let already_paid = payments
            .iter()
            .filter(|payment| payment.settles(vendor_id))
            .map(|payment| payment.amount)
            .sum();
        VendorBalance::new(vendor_id, billed_amount, bill_balance, already_paid)
    }

    /// Recomputes every vendor's balance from the full record sets.
    pub fn compute(
        vendors: &[Vendor],
        bills: &[BillingTransaction],
        payments: &[Payment],
        fallback_rate: f64,
    ) -> BalanceSheet {
        let mut billed: HashMap<Uuid, (f64, f64)> = HashMap::new();
        for bill in bills {
            let entry = billed.entry(bill.vendor_id).or_default();
            entry.0 += bill.total;
            entry.1 += bill.vendor_share(fallback_rate);
        }
        let mut paid: HashMap<Uuid, f64> = HashMap::new();
        for payment in payments {
            if let Some(vendor_id) = payment.vendor_id.filter(|id| payment.settles(*id)) {
                *paid.entry(vendor_id).or_default() += payment.amount;
            }
        }

        let balances = vendors
            .iter()
            .map(|vendor| {
                let (billed_amount, bill_balance) =
                    billed.get(&vendor.id).copied().unwrap_or_default();
                let already_paid = paid.get(&vendor.id).copied().unwrap_or_default();
                VendorBalance::new(vendor.id, billed_amount, bill_balance, already_paid)
            })
            .collect();
        BalanceSheet::from_balances(balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BillingEntry;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn bill(vendor: &Vendor, price: f64, quantity: u32, rate: Option<f64>) -> BillingTransaction {
        let mut entry = BillingEntry::new(price, quantity);
        entry.commission_rate = rate;
        BillingTransaction::new(vendor.id, vec![entry])
    }

    #[test]
    fn balance_deducts_commission_and_payments() {
        let vendor = Vendor::new("Juice Bar", "Meera");
        let bills = vec![
            bill(&vendor, 500.0, 2, Some(10.0)),
            bill(&vendor, 100.0, 1, None),
        ];
        let payments = vec![
            Payment::participant(vendor.id, 300.0, None),
            Payment::other("Generator", 999.0),
        ];

        let balance = BalanceService::vendor_balance(vendor.id, &bills, &payments, 20.0);
        assert_close(balance.billed_amount, 1100.0);
        assert_close(balance.bill_balance, 900.0 + 80.0);
        assert_close(balance.already_paid, 300.0);
        assert_close(balance.remaining_balance, 680.0);
        assert_eq!(balance.credit(), 0.0);
    }

    #[test]
    fn overpayment_is_clamped_but_reported() {
        let vendor = Vendor::new("Pickles", "Joseph");
        let bills = vec![bill(&vendor, 100.0, 1, Some(0.0))];
        let payments = vec![Payment::participant(vendor.id, 160.0, None)];

        let sheet = BalanceService::compute(&[vendor.clone()], &bills, &payments, 20.0);
        let balance = sheet.get(vendor.id).unwrap();
        assert_eq!(balance.remaining_balance, 0.0);
        assert_close(balance.signed_balance, -60.0);
        assert_close(balance.credit(), 60.0);
        assert_eq!(sheet.overpaid().len(), 1);
        assert!(sheet.vendors_with_pending().is_empty());
    }

    #[test]
    fn compute_matches_single_vendor_derivation() {
        let first = Vendor::new("Biryani", "Anwar");
        let second = Vendor::new("Sweets", "Lata");
        let bills = vec![
            bill(&first, 250.0, 4, Some(15.0)),
            bill(&second, 80.0, 3, None),
            bill(&first, 40.0, 1, None),
        ];
        let payments = vec![
            Payment::participant(first.id, 100.0, None),
            Payment::participant(second.id, 50.0, None),
        ];
        let vendors = vec![first.clone(), second.clone()];
        let sheet = BalanceService::compute(&vendors, &bills, &payments, 20.0);

        for vendor in &vendors {
            let single = BalanceService::vendor_balance(vendor.id, &bills, &payments, 20.0);
            let from_sheet = sheet.get(vendor.id).unwrap();
            assert_close(from_sheet.bill_balance, single.bill_balance);
            assert_close(from_sheet.remaining_balance, single.remaining_balance);
        }
        let order: Vec<Uuid> = sheet.iter().map(|balance| balance.vendor_id).collect();
        assert_eq!(order, vec![first.id, second.id]);
    }

    #[test]
    fn vendor_without_activity_owes_nothing() {
        let vendor = Vendor::new("Empty", "Nobody");
        let sheet = BalanceService::compute(&[vendor.clone()], &[], &[], 20.0);
        let balance = sheet.get(vendor.id).unwrap();
        assert_eq!(balance.bill_balance, 0.0);
        assert_eq!(balance.remaining_balance, 0.0);
        assert_eq!(sheet.remaining(Uuid::new_v4()), 0.0);
    }

    #[test]
    fn total_pending_counts_each_vendor_once() {
        let first = Vendor::new("A", "a");
        let second = Vendor::new("B", "b");
        let bills = vec![
            bill(&first, 100.0, 1, Some(0.0)),
            bill(&second, 50.0, 1, Some(0.0)),
        ];
        let sheet = BalanceService::compute(&[first.clone(), second.clone()], &bills, &[], 20.0);
        assert_close(sheet.total_pending(&[first.id, second.id, first.id]), 150.0);
        assert_eq!(sheet.vendors_with_pending(), vec![first.id, second.id]);
    }

    #[test]
    fn remaining_balance_never_negative() {
        let vendor = Vendor::new("Overpaid", "x");
        for paid in [0.0, 10.0, 1e6, 1e12] {
            let payments = vec![Payment::participant(vendor.id, paid, None)];
            let bills = vec![bill(&vendor, 10.0, 1, None)];
            let balance = BalanceService::vendor_balance(vendor.id, &bills, &payments, 20.0);
            assert!(balance.remaining_balance >= 0.0);
        }
    }
}
