use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::MoadianError;
use super::types::{InvoiceLineItem, InvoiceTotals, LineAmounts};

/// How a line's VAT is brought to currency precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Commercial rounding, midpoint away from zero.
    #[default]
    HalfUp,
    /// Drop the fraction (the integer cast older clients used).
    Truncate,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::Truncate => RoundingStrategy::ToZero,
        }
    }
}

/// Per-line and per-invoice VAT arithmetic.
///
/// Each line's VAT is rounded on its own; invoice totals are the sum of the
/// rounded lines. The service recomputes amounts the same way and rejects a
/// grand total that differs by a single currency unit, so totals must never
/// be rounded after summing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountCalculator {
    /// Decimal places of the currency (0 for Rial).
    pub precision: u32,
    pub rounding: RoundingMode,
}

impl Default for AmountCalculator {
    fn default() -> Self {
        Self {
            precision: 0,
            rounding: RoundingMode::HalfUp,
        }
    }
}

impl AmountCalculator {
    /// Rial amounts (no decimal places), half-up rounding.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    /// Compute one line's amounts.
    ///
    /// Requires `unit_fee ≥ 0`, `quantity > 0`, `0 ≤ discount ≤ unit_fee * quantity`
    /// and `vat_rate ≥ 0`.
    pub fn compute_line(
        &self,
        unit_fee: Decimal,
        quantity: Decimal,
        discount: Decimal,
        vat_rate: Decimal,
    ) -> Result<LineAmounts, MoadianError> {
        if unit_fee < Decimal::ZERO {
            return Err(MoadianError::Validation(format!(
                "unit fee must not be negative, got {unit_fee}"
            )));
        }
        if quantity <= Decimal::ZERO {
            return Err(MoadianError::Validation(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        if vat_rate < Decimal::ZERO {
            return Err(MoadianError::Validation(format!(
                "VAT rate must not be negative, got {vat_rate}"
            )));
        }

        let pre_discount = unit_fee.checked_mul(quantity).ok_or_else(|| {
            MoadianError::Validation(format!("{unit_fee} * {quantity} overflows"))
        })?;

        if discount < Decimal::ZERO || discount > pre_discount {
            return Err(MoadianError::Validation(format!(
                "discount {discount} must be between 0 and {pre_discount}"
            )));
        }

        let net = pre_discount - discount;
        let vat = net
            .checked_mul(vat_rate)
            .map(|v| self.round(v / dec!(100)))
            .ok_or_else(|| {
                MoadianError::Validation(format!("VAT on {net} at {vat_rate}% overflows"))
            })?;
        let total = net.checked_add(vat).ok_or_else(|| {
            MoadianError::Validation(format!("{net} + {vat} overflows"))
        })?;

        Ok(LineAmounts {
            pre_discount,
            discount,
            net,
            vat,
            total,
        })
    }

    /// Compute invoice totals as the sum of per-line rounded amounts.
    ///
    /// Each line is recomputed from its inputs with this calculator, so the
    /// totals follow this calculator's precision and rounding even if the
    /// lines were built with another one.
    pub fn compute_invoice(
        &self,
        lines: &[InvoiceLineItem],
    ) -> Result<InvoiceTotals, MoadianError> {
        let amounts = lines
            .iter()
            .map(|line| {
                self.compute_line(line.unit_fee, line.quantity, line.discount, line.vat_rate)
            })
            .collect::<Result<Vec<_>, _>>()?;
        sum_lines(&amounts)
    }

    fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.precision, self.rounding.strategy())
    }
}

/// Sum per-line amounts in order. No rounding happens here.
pub fn sum_lines<'a>(
    amounts: impl IntoIterator<Item = &'a LineAmounts>,
) -> Result<InvoiceTotals, MoadianError> {
    fn add(sum: Decimal, value: Decimal, field: &str) -> Result<Decimal, MoadianError> {
        sum.checked_add(value)
            .ok_or_else(|| MoadianError::Validation(format!("invoice {field} overflows")))
    }

    let mut totals = InvoiceTotals::default();
    for a in amounts {
        totals.pre_discount_total =
            add(totals.pre_discount_total, a.pre_discount, "pre-discount total")?;
        totals.discount_total = add(totals.discount_total, a.discount, "discount total")?;
        totals.net_total = add(totals.net_total, a.net, "net total")?;
        totals.vat_total = add(totals.vat_total, a.vat, "VAT total")?;
    }
    totals.grand_total = add(totals.net_total, totals.vat_total, "grand total")?;
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> AmountCalculator {
        AmountCalculator::new()
    }

    #[test]
    fn ten_percent_line() {
        let a = calc()
            .compute_line(dec!(10000), dec!(1), dec!(0), dec!(10))
            .unwrap();
        assert_eq!(a.net, dec!(10000));
        assert_eq!(a.vat, dec!(1000));
        assert_eq!(a.total, dec!(11000));
    }

    #[test]
    fn nine_percent_two_units() {
        let a = calc()
            .compute_line(dec!(100000), dec!(2), dec!(0), dec!(9))
            .unwrap();
        assert_eq!(a.pre_discount, dec!(200000));
        assert_eq!(a.net, dec!(200000));
        assert_eq!(a.vat, dec!(18000));
        assert_eq!(a.total, dec!(218000));
    }

    #[test]
    fn discount_reduces_base() {
        let a = calc()
            .compute_line(dec!(5000), dec!(3), dec!(1500), dec!(10))
            .unwrap();
        // 15000 - 1500 = 13500, VAT 1350
        assert_eq!(a.net, dec!(13500));
        assert_eq!(a.vat, dec!(1350));
        assert_eq!(a.total, dec!(14850));
    }

    #[test]
    fn half_up_rounding() {
        // 105 * 10% = 10.5 → 11
        let a = calc()
            .compute_line(dec!(105), dec!(1), dec!(0), dec!(10))
            .unwrap();
        assert_eq!(a.vat, dec!(11));
        // 104 * 10% = 10.4 → 10
        let b = calc()
            .compute_line(dec!(104), dec!(1), dec!(0), dec!(10))
            .unwrap();
        assert_eq!(b.vat, dec!(10));
    }

    #[test]
    fn truncate_rounding() {
        let c = calc().with_rounding(RoundingMode::Truncate);
        let a = c
            .compute_line(dec!(109), dec!(1), dec!(0), dec!(10))
            .unwrap();
        assert_eq!(a.vat, dec!(10));
    }

    #[test]
    fn precision_two() {
        let c = calc().with_precision(2);
        // 29.99 * 3 = 89.97, 7% = 6.2979 → 6.30
        let a = c
            .compute_line(dec!(29.99), dec!(3), dec!(0), dec!(7))
            .unwrap();
        assert_eq!(a.vat, dec!(6.30));
        assert_eq!(a.total, dec!(96.27));
    }

    #[test]
    fn discount_above_amount_rejected() {
        let err = calc()
            .compute_line(dec!(100), dec!(2), dec!(201), dec!(10))
            .unwrap_err();
        assert!(matches!(err, MoadianError::Validation(_)));
        assert!(calc()
            .compute_line(dec!(100), dec!(2), dec!(200), dec!(10))
            .is_ok());
    }

    #[test]
    fn out_of_range_inputs_rejected() {
        let c = calc();
        assert!(c.compute_line(dec!(-1), dec!(1), dec!(0), dec!(10)).is_err());
        assert!(c.compute_line(dec!(100), dec!(0), dec!(0), dec!(10)).is_err());
        assert!(c.compute_line(dec!(100), dec!(-1), dec!(0), dec!(10)).is_err());
        assert!(c.compute_line(dec!(100), dec!(1), dec!(-1), dec!(10)).is_err());
        assert!(c.compute_line(dec!(100), dec!(1), dec!(0), dec!(-5)).is_err());
    }

    #[test]
    fn zero_fee_and_zero_rate_allowed() {
        let a = calc()
            .compute_line(dec!(0), dec!(1), dec!(0), dec!(0))
            .unwrap();
        assert_eq!(a.total, dec!(0));
    }

    #[test]
    fn overflow_is_validation_error() {
        let err = calc()
            .compute_line(Decimal::MAX, dec!(2), dec!(0), dec!(10))
            .unwrap_err();
        assert!(matches!(err, MoadianError::Validation(_)));
    }

    #[test]
    fn sum_of_rounded_lines() {
        let c = calc();
        // Each line: 105 * 10% = 10.5 → 11; summed 22.
        // Rounding after the sum would give 210 * 10% = 21.
        let line = c
            .compute_line(dec!(105), dec!(1), dec!(0), dec!(10))
            .unwrap();
        let totals = sum_lines([&line, &line]).unwrap();
        assert_eq!(totals.net_total, dec!(210));
        assert_eq!(totals.vat_total, dec!(22));
        assert_eq!(totals.grand_total, dec!(232));
    }

    #[test]
    fn empty_invoice_is_zero() {
        let totals = calc().compute_invoice(&[]).unwrap();
        assert_eq!(totals, InvoiceTotals::default());
    }

    #[test]
    fn totals_overflow_is_validation_error() {
        // Every line fits on its own; four of them do not.
        let c = calc();
        let fee = (Decimal::MAX / dec!(3)).trunc();
        let line = c.compute_line(fee, dec!(1), dec!(0), dec!(0)).unwrap();
        let err = sum_lines([&line, &line, &line, &line]).unwrap_err();
        assert!(matches!(err, MoadianError::Validation(_)));
    }

    #[test]
    fn invoice_recomputes_lines_with_its_own_rounding() {
        // 109 * 10% = 10.9: half-up gives 11, truncation gives 10.
        let line = crate::core::LineItemBuilder::new("2330004219206", "Item", dec!(109))
            .build(&calc())
            .unwrap();
        assert_eq!(line.vat(), dec!(11));
        let truncating = calc().with_rounding(RoundingMode::Truncate);
        let totals = truncating.compute_invoice(std::slice::from_ref(&line)).unwrap();
        assert_eq!(totals.vat_total, dec!(10));
        assert_eq!(totals.grand_total, dec!(119));
    }
}
