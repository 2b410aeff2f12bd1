//! Conversions between cost price, selling price (MRP) and commission rate.
//!
//! Any two of the three values determine the third:
//! `selling = cost / (1 - rate / 100)` and `rate = (selling - cost) / selling * 100`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::{approx_eq, round_cents};

/// Commission applied to sales and new products when none is recorded.
pub const DEFAULT_COMMISSION_RATE: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommissionError {
    #[error("selling price must be positive, got {0}")]
    NonPositiveSellingPrice(f64),
    #[error("cost price must be positive, got {0}")]
    NonPositiveCostPrice(f64),
    #[error("commission rate must be at least 0 and below 100, got {0}")]
    RateOutOfRange(f64),
    #[error("selling price {selling_price} does not match cost {cost_price} at {commission_rate}% commission")]
    Inconsistent {
        cost_price: f64,
        selling_price: f64,
        commission_rate: f64,
    },
}

/// Commission rate implied by a cost and a selling price.
pub fn derive_commission(cost_price: f64, selling_price: f64) -> Result<f64, CommissionError> {
    if !(selling_price > 0.0) {
        return Err(CommissionError::NonPositiveSellingPrice(selling_price));
    }
    Ok((selling_price - cost_price) / selling_price * 100.0)
}

/// Selling price that leaves `cost_price` for the vendor after `commission_rate` is retained.
pub fn derive_selling_price(cost_price: f64, commission_rate: f64) -> Result<f64, CommissionError> {
    check_rate(commission_rate)?;
    Ok(cost_price / (1.0 - commission_rate / 100.0))
}

/// Vendor's take of `selling_price` once `commission_rate` is retained.
pub fn derive_cost_price(selling_price: f64, commission_rate: f64) -> Result<f64, CommissionError> {
    check_rate(commission_rate)?;
    Ok(selling_price * (1.0 - commission_rate / 100.0))
}

fn check_rate(commission_rate: f64) -> Result<(), CommissionError> {
    if (0.0..100.0).contains(&commission_rate) {
        Ok(())
    } else {
        Err(CommissionError::RateOutOfRange(commission_rate))
    }
}

/// A complete set of product prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTriple {
    pub cost_price: f64,
    pub selling_price: f64,
    pub commission_rate: f64,
}

impl PriceTriple {
    /// Completes a triple from cost and commission rate.
    pub fn from_cost(cost_price: f64, commission_rate: f64) -> Result<Self, CommissionError> {
        let selling_price = derive_selling_price(cost_price, commission_rate)?;
        Ok(Self {
            cost_price,
            selling_price,
            commission_rate,
        })
    }

    /// Completes a triple from cost and selling price.
    pub fn from_prices(cost_price: f64, selling_price: f64) -> Result<Self, CommissionError> {
        let commission_rate = derive_commission(cost_price, selling_price)?;
        Ok(Self {
            cost_price,
            selling_price,
            commission_rate,
        })
    }

    /// Checks ranges and that the selling price agrees with cost and rate within `tolerance`.
    pub fn validate(&self, tolerance: f64) -> Result<(), CommissionError> {
        if !(self.cost_price > 0.0) {
            return Err(CommissionError::NonPositiveCostPrice(self.cost_price));
        }
        if !(self.selling_price > 0.0) {
            return Err(CommissionError::NonPositiveSellingPrice(self.selling_price));
        }
        let expected = derive_selling_price(self.cost_price, self.commission_rate)?;
        if !approx_eq(expected, self.selling_price, tolerance) {
            return Err(CommissionError::Inconsistent {
                cost_price: self.cost_price,
                selling_price: self.selling_price,
                commission_rate: self.commission_rate,
            });
        }
        Ok(())
    }
}

/// The three editable price fields of a product form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceField {
    Cost,
    Selling,
    Commission,
}

impl PriceField {
    const ALL: [PriceField; 3] = [PriceField::Cost, PriceField::Selling, PriceField::Commission];

    fn third(self, other: PriceField) -> PriceField {
        Self::ALL
            .into_iter()
            .find(|field| *field != self && *field != other)
            .unwrap_or(self)
    }
}

/// Tracks product price edits and recomputes the field that was not pinned.
///
/// The most recently edited field stays fixed together with the field edited
/// just before it; the remaining field is derived. Derived values keep full
/// precision so the finished triple stays consistent; use [`Self::display`]
/// for the two-decimal form shown to users.
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionEditor {
    cost_price: f64,
    selling_price: f64,
    commission_rate: f64,
    /// Distinct fields in edit order, most recent last.
    edit_order: Vec<PriceField>,
}

impl CommissionEditor {
    /// Blank form for a new product, pre-filled with `default_rate`.
    pub fn new(default_rate: f64) -> Self {
        Self {
            cost_price: 0.0,
            selling_price: 0.0,
            commission_rate: default_rate,
            edit_order: vec![PriceField::Commission],
        }
    }

    /// Form pre-filled from stored prices. Cost counts as the latest pinned value.
    pub fn from_prices(prices: PriceTriple) -> Self {
        Self {
            cost_price: prices.cost_price,
            selling_price: prices.selling_price,
            commission_rate: prices.commission_rate,
            edit_order: vec![PriceField::Selling, PriceField::Cost],
        }
    }

    pub fn last_edited(&self) -> Option<PriceField> {
        self.edit_order.last().copied()
    }

    pub fn value(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Cost => self.cost_price,
            PriceField::Selling => self.selling_price,
            PriceField::Commission => self.commission_rate,
        }
    }

    /// Value of `field` rounded to two decimals.
    pub fn display(&self, field: PriceField) -> f64 {
        round_cents(self.value(field))
    }

    fn set(&mut self, field: PriceField, value: f64) {
        match field {
            PriceField::Cost => self.cost_price = value,
            PriceField::Selling => self.selling_price = value,
            PriceField::Commission => self.commission_rate = value,
        }
    }

    fn usable(field: PriceField, value: f64) -> bool {
        match field {
            PriceField::Commission => value > 0.0 && value < 100.0,
            _ => value > 0.0,
        }
    }

    /// Stores `value` into `field` and returns the field that was recomputed, if any.
    ///
    /// Nothing is recomputed when the edited value or every companion value is unusable.
    pub fn edit(&mut self, field: PriceField, value: f64) -> Option<PriceField> {
        self.set(field, value);
        let partner = self
            .edit_order
            .iter()
            .rev()
            .copied()
            .chain(PriceField::ALL)
            .filter(|candidate| *candidate != field)
            .find(|candidate| Self::usable(*candidate, self.value(*candidate)));

        self.edit_order.retain(|existing| *existing != field);
        self.edit_order.push(field);

        if !Self::usable(field, value) {
            return None;
        }
        let partner = partner?;
        let derived = field.third(partner);
        let result = match derived {
            PriceField::Commission => derive_commission(self.cost_price, self.selling_price),
            PriceField::Selling => derive_selling_price(self.cost_price, self.commission_rate),
            PriceField::Cost => derive_cost_price(self.selling_price, self.commission_rate),
        };
        match result {
            Ok(computed) => {
                self.set(derived, computed);
                Some(derived)
            }
            Err(_) => None,
        }
    }

    /// Returns the validated prices held by the form.
    pub fn finish(&self, tolerance: f64) -> Result<PriceTriple, CommissionError> {
        let prices = PriceTriple {
            cost_price: self.cost_price,
            selling_price: self.selling_price,
            commission_rate: self.commission_rate,
        };
        prices.validate(tolerance)?;
        Ok(prices)
    }
}

impl Default for CommissionEditor {
    fn default() -> Self {
        Self::new(DEFAULT_COMMISSION_RATE)
    }
}
