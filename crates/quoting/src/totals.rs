//! Sales tax and quote totals.

use serde::{Deserialize, Serialize};

use quotedesk_core::{DomainError, DomainResult, Money};

/// A sales-tax rate in basis points (9.75% == 975 bp).
///
/// Integer basis points keep tax arithmetic exact; floats only appear when
/// parsing operator input.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    pub const ZERO: TaxRate = TaxRate(0);

    /// The Santa Cruz County combined sales-tax rate.
    pub const SANTA_CRUZ_COUNTY: TaxRate = TaxRate(975);

    pub const fn from_basis_points(bp: u32) -> Self {
        Self(bp)
    }

    /// Parse an operator-entered percentage (e.g. `9.75`).
    pub fn from_percent(percent: f64) -> DomainResult<Self> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(DomainError::validation(format!(
                "tax rate must be a percentage between 0 and 100, got {percent}"
            )));
        }
        Ok(Self((percent * 100.0).round() as u32))
    }

    pub const fn basis_points(self) -> u32 {
        self.0
    }

    pub fn percent(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Tax owed on `base`, rounded to the nearest cent (half away from zero).
    pub fn apply(self, base: Money) -> Money {
        let numerator = i128::from(base.cents()) * i128::from(self.0);
        let half = if numerator >= 0 { 5_000 } else { -5_000 };
        Money::from_cents(((numerator + half) / 10_000) as i64)
    }
}

/// How the operator chose the tax rate for a quote.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxSelection {
    /// A manually entered rate.
    Manual(TaxRate),
    /// The Santa Cruz County preset.
    SantaCruzCounty,
}

impl TaxSelection {
    pub fn rate(self) -> TaxRate {
        match self {
            TaxSelection::Manual(rate) => rate,
            TaxSelection::SantaCruzCounty => TaxRate::SANTA_CRUZ_COUNTY,
        }
    }
}

impl Default for TaxSelection {
    fn default() -> Self {
        TaxSelection::Manual(TaxRate::ZERO)
    }
}

/// Derived money summary of a quote.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTotals {
    /// Sum of all line totals, including the derived discount line.
    pub subtotal: Money,
    pub drop_ship_fee: Money,
    pub freight: Money,
    pub tax_rate: TaxRate,
    pub sales_tax: Money,
    pub grand_total: Money,
}

impl QuoteTotals {
    /// Fees join the taxable base before the rate is applied.
    pub fn compute(subtotal: Money, drop_ship_fee: Money, freight: Money, rate: TaxRate) -> Self {
        let pre_tax = subtotal + drop_ship_fee + freight;
        let sales_tax = rate.apply(pre_tax);
        Self {
            subtotal,
            drop_ship_fee,
            freight,
            tax_rate: rate,
            sales_tax,
            grand_total: pre_tax + sales_tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn santa_cruz_preset_is_nine_point_seven_five() {
        assert_eq!(TaxSelection::SantaCruzCounty.rate().percent(), 9.75);
    }

    #[test]
    fn from_percent_validates_range() {
        assert_eq!(TaxRate::from_percent(9.75).unwrap(), TaxRate::from_basis_points(975));
        assert_eq!(TaxRate::from_percent(0.0).unwrap(), TaxRate::ZERO);
        assert!(TaxRate::from_percent(-1.0).is_err());
        assert!(TaxRate::from_percent(100.5).is_err());
        assert!(TaxRate::from_percent(f64::NAN).is_err());
    }

    #[test]
    fn tax_rounds_half_away_from_zero() {
        // $100.10 at 9.75% = $9.75975 -> $9.76
        let rate = TaxRate::SANTA_CRUZ_COUNTY;
        assert_eq!(rate.apply(Money::from_cents(10_010)), Money::from_cents(976));
        // $100.00 at 9.75% = $9.75 exactly
        assert_eq!(rate.apply(Money::from_cents(10_000)), Money::from_cents(975));
        assert_eq!(rate.apply(Money::from_cents(-10_010)), Money::from_cents(-976));
    }

    #[test]
    fn fees_are_part_of_the_taxable_base() {
        let totals = QuoteTotals::compute(
            Money::from_cents(100_000),
            Money::from_cents(2_500),
            Money::from_cents(10_000),
            TaxRate::from_basis_points(1_000),
        );
        assert_eq!(totals.sales_tax, Money::from_cents(11_250));
        assert_eq!(totals.grand_total, Money::from_cents(123_750));
    }

    #[test]
    fn zero_rate_means_zero_tax() {
        let totals = QuoteTotals::compute(
            Money::from_cents(49_900),
            Money::ZERO,
            Money::ZERO,
            TaxRate::ZERO,
        );
        assert_eq!(totals.sales_tax, Money::ZERO);
        assert_eq!(totals.grand_total, totals.subtotal);
    }

    proptest! {
        /// grand_total always equals pre-tax plus tax, and tax is within one
        /// cent of the exact rational value.
        #[test]
        fn totals_are_internally_consistent(
            subtotal in -1_000_000i64..10_000_000,
            drop_ship in 0i64..100_000,
            freight in 0i64..100_000,
            bp in 0u32..2_000,
        ) {
            let totals = QuoteTotals::compute(
                Money::from_cents(subtotal),
                Money::from_cents(drop_ship),
                Money::from_cents(freight),
                TaxRate::from_basis_points(bp),
            );

            let pre_tax = subtotal + drop_ship + freight;
            prop_assert_eq!(totals.grand_total.cents(), pre_tax + totals.sales_tax.cents());

            let exact = (pre_tax as f64) * (bp as f64) / 10_000.0;
            prop_assert!((totals.sales_tax.cents() as f64 - exact).abs() <= 0.5 + f64::EPSILON);
        }
    }
}
