use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::MoadianError;

/// Width of a fiscal scope (Moadian "memory id").
pub const FISCAL_SCOPE_LEN: usize = 6;

/// Width of a product/service identifier (`sstid`).
pub const PRODUCT_ID_LEN: usize = 13;

/// Six-character identifier of a taxpayer's issuing device.
///
/// Namespaces the serial sequence. ASCII letters are upper-cased on parse, so
/// `"a3nfzt"` and `"A3NFZT"` name the same scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalScope(String);

impl FiscalScope {
    /// Parse and normalize a fiscal scope.
    pub fn parse(value: &str) -> Result<Self, MoadianError> {
        if value.len() != FISCAL_SCOPE_LEN {
            return Err(MoadianError::Scope(format!(
                "fiscal scope must be {FISCAL_SCOPE_LEN} characters, got {} in '{value}'",
                value.chars().count()
            )));
        }
        if let Some(c) = value.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(MoadianError::Scope(format!(
                "fiscal scope '{value}' contains invalid character '{c}'"
            )));
        }
        Ok(Self(value.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FiscalScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for FiscalScope {
    type Err = MoadianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FiscalScope {
    type Error = MoadianError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FiscalScope> for String {
    fn from(scope: FiscalScope) -> Self {
        scope.0
    }
}

/// Derived amounts of one invoice line, all already rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    /// `unit_fee * quantity` (`prdis`).
    pub pre_discount: Decimal,
    /// Discount applied to the line (`dis`).
    pub discount: Decimal,
    /// `pre_discount - discount` (`adis`).
    pub net: Decimal,
    /// VAT on `net`, rounded to currency precision (`vam`).
    pub vat: Decimal,
    /// `net + vat` (`tsstam`).
    pub total: Decimal,
}

/// A single invoice line with its derived amounts.
///
/// Lines are only created by [`LineItemBuilder::build`](super::LineItemBuilder::build),
/// which validates the inputs and computes the amounts. The fields are
/// read-only, so the amounts always match the inputs. To load lines from
/// JSON, deserialize a [`LineItemBuilder`](super::LineItemBuilder) and build it.
///
/// ```compile_fail
/// use moadian::core::*;
/// use rust_decimal_macros::dec;
///
/// let mut line = LineItemBuilder::new("2330004219206", "Item", dec!(10000))
///     .build(&AmountCalculator::new())
///     .unwrap();
/// line.unit_fee = dec!(50000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceLineItem {
    /// 13-digit product or service identifier (`sstid`).
    pub(crate) product_id: String,
    /// Product or service description (`sstt`).
    pub(crate) description: String,
    /// Unit price in currency units (`fee`).
    pub(crate) unit_fee: Decimal,
    /// Quantity (`am`).
    pub(crate) quantity: Decimal,
    /// Line discount in currency units.
    pub(crate) discount: Decimal,
    /// VAT rate in percent (`vra`).
    pub(crate) vat_rate: Decimal,
    pub(crate) amounts: LineAmounts,
}

impl InvoiceLineItem {
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn unit_fee(&self) -> Decimal {
        self.unit_fee
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn vat_rate(&self) -> Decimal {
        self.vat_rate
    }

    pub fn amounts(&self) -> &LineAmounts {
        &self.amounts
    }

    pub fn net(&self) -> Decimal {
        self.amounts.net
    }

    pub fn vat(&self) -> Decimal {
        self.amounts.vat
    }

    pub fn total(&self) -> Decimal {
        self.amounts.total
    }
}

/// Aggregate totals over an ordered sequence of lines.
///
/// Every field is the sum of already-rounded per-line values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Sum of line `pre_discount` (`tprdis`).
    pub pre_discount_total: Decimal,
    /// Sum of line discounts (`tdis`).
    pub discount_total: Decimal,
    /// Sum of line `net` (`tadis`).
    pub net_total: Decimal,
    /// Sum of line `vat` (`tvam`).
    pub vat_total: Decimal,
    /// `net_total + vat_total` (`tbill`).
    pub grand_total: Decimal,
}

/// Validate a 13-digit product identifier.
pub fn validate_product_id(product_id: &str) -> Result<(), MoadianError> {
    if product_id.len() != PRODUCT_ID_LEN || !product_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(MoadianError::Validation(format!(
            "product id must be {PRODUCT_ID_LEN} digits, got '{product_id}'"
        )));
    }
    Ok(())
}
