use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::amounts::AmountCalculator;
use super::error::MoadianError;
use super::types::{InvoiceLineItem, validate_product_id};

/// Builder for [`InvoiceLineItem`].
///
/// ```
/// use moadian::core::*;
/// use rust_decimal_macros::dec;
///
/// let line = LineItemBuilder::new("2330004219206", "Test product", dec!(10000))
///     .build(&AmountCalculator::new())
///     .unwrap();
/// assert_eq!(line.vat(), dec!(1000));
/// ```
///
/// The builder also serves as the serialized form of a line's inputs.
/// Missing `quantity`, `discount` and `vat_rate` take the same defaults as
/// [`LineItemBuilder::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemBuilder {
    product_id: String,
    description: String,
    unit_fee: Decimal,
    #[serde(default = "default_quantity")]
    quantity: Decimal,
    #[serde(default)]
    discount: Decimal,
    #[serde(default = "default_vat_rate")]
    vat_rate: Decimal,
}

fn default_quantity() -> Decimal {
    Decimal::ONE
}

fn default_vat_rate() -> Decimal {
    dec!(10)
}

impl LineItemBuilder {
    /// One unit, no discount, 10% VAT.
    pub fn new(
        product_id: impl Into<String>,
        description: impl Into<String>,
        unit_fee: Decimal,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            description: description.into(),
            unit_fee,
            quantity: default_quantity(),
            discount: Decimal::ZERO,
            vat_rate: default_vat_rate(),
        }
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    /// Discount for the whole line, in currency units.
    pub fn discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    /// VAT rate in percent.
    pub fn vat_rate(mut self, rate: Decimal) -> Self {
        self.vat_rate = rate;
        self
    }

    /// Validate inputs and compute the line's amounts.
    pub fn build(self, calculator: &AmountCalculator) -> Result<InvoiceLineItem, MoadianError> {
        validate_product_id(&self.product_id)?;
        let amounts =
            calculator.compute_line(self.unit_fee, self.quantity, self.discount, self.vat_rate)?;

        Ok(InvoiceLineItem {
            product_id: self.product_id,
            description: self.description,
            unit_fee: self.unit_fee,
            quantity: self.quantity,
            discount: self.discount,
            vat_rate: self.vat_rate,
            amounts,
        })
    }
}
