use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::checksum;
use super::error::{ChecksumMismatch, MoadianError};
use super::numbering::{INVOICE_NUMBER_WIDTH, InvoiceNumber, format_hex, parse_hex};
use super::types::{FISCAL_SCOPE_LEN, FiscalScope};

/// Width of the day field (hex days since the Unix epoch).
pub const DAY_WIDTH: usize = 5;

/// Total tax identifier width: scope, day, serial and one check digit.
pub const TAX_ID_LEN: usize = FISCAL_SCOPE_LEN + DAY_WIDTH + INVOICE_NUMBER_WIDTH + 1;

/// Largest day number representable in [`DAY_WIDTH`] hex digits.
pub const MAX_DAY: u64 = (1 << (4 * DAY_WIDTH)) - 1;

const MS_PER_DAY: u64 = 86_400_000;

/// Moadian tax identifier (`taxid`).
///
/// Layout, 22 characters:
///
/// | Field | Width | Encoding |
/// |-------|-------|----------|
/// | fiscal scope | 6 | as issued, upper-case |
/// | day | 5 | hex days since 1970-01-01 UTC |
/// | serial | 10 | hex, same as the invoice number |
/// | check | 1 | Verhoeff digit over the numeric derivation |
///
/// The numeric derivation maps each of the first 21 characters to its
/// base-36 value written in decimal (`'7'` → `7`, `'A'` → `10`, `'Z'` → `35`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxIdentifier {
    value: String,
    scope: FiscalScope,
    day: u64,
    invoice_number: InvoiceNumber,
}

impl TaxIdentifier {
    /// Parse a tax identifier, checking widths, alphabet and check digit.
    pub fn parse(value: &str) -> Result<Self, MoadianError> {
        if value.len() != TAX_ID_LEN || !value.is_ascii() {
            return Err(MoadianError::Format(format!(
                "tax identifier must be {TAX_ID_LEN} ASCII characters, got '{value}'"
            )));
        }
        let (scope, rest) = value.split_at(FISCAL_SCOPE_LEN);
        let (day, rest) = rest.split_at(DAY_WIDTH);
        let (serial, check) = rest.split_at(INVOICE_NUMBER_WIDTH);

        let scope = FiscalScope::parse(scope)?;
        let day = parse_hex(day, DAY_WIDTH, "day")?;
        let serial = parse_hex(serial, INVOICE_NUMBER_WIDTH, "serial")?;
        let found = match check.as_bytes() {
            [b] if b.is_ascii_digit() => b - b'0',
            _ => {
                return Err(MoadianError::Format(format!(
                    "check character '{check}' is not a digit"
                )));
            }
        };

        let expected = check_digit(&value[..TAX_ID_LEN - 1]);
        if expected != found {
            return Err(ChecksumMismatch { expected, found }.into());
        }

        // Re-encode so lower-case hex input normalizes to the issued form
        encode_day(&scope, day, serial)
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn scope(&self) -> &FiscalScope {
        &self.scope
    }

    /// Days since the Unix epoch.
    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn serial(&self) -> u64 {
        self.invoice_number.serial()
    }

    pub fn check_digit(&self) -> u8 {
        self.value.as_bytes()[TAX_ID_LEN - 1] - b'0'
    }

    /// Calendar date (UTC) of the day field.
    pub fn issue_date(&self) -> Option<NaiveDate> {
        let secs = i64::try_from(self.day.checked_mul(86_400)?).ok()?;
        DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
    }

    /// The invoice number encoding the same serial.
    pub fn invoice_number(&self) -> &InvoiceNumber {
        &self.invoice_number
    }

    /// Digits the check digit is computed over, check digit excluded.
    pub fn numeric_derivation(&self) -> Vec<u8> {
        numeric_derivation(&self.value[..TAX_ID_LEN - 1])
    }
}

impl std::fmt::Display for TaxIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for TaxIdentifier {
    type Error = MoadianError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaxIdentifier> for String {
    fn from(id: TaxIdentifier) -> Self {
        id.value
    }
}

/// Encodes tax identifiers and invoice numbers for one fiscal scope.
#[derive(Debug, Clone)]
pub struct TaxIdEncoder {
    scope: FiscalScope,
}

impl TaxIdEncoder {
    pub fn new(scope: FiscalScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> &FiscalScope {
        &self.scope
    }

    pub fn encode(&self, timestamp_ms: u64, serial: u64) -> Result<TaxIdentifier, MoadianError> {
        encode_identifier(&self.scope, timestamp_ms, serial)
    }

    pub fn encode_at(
        &self,
        at: DateTime<Utc>,
        serial: u64,
    ) -> Result<TaxIdentifier, MoadianError> {
        let timestamp_ms = u64::try_from(at.timestamp_millis()).map_err(|_| {
            MoadianError::Format(format!("timestamp {at} is before the Unix epoch"))
        })?;
        self.encode(timestamp_ms, serial)
    }

    pub fn invoice_number(&self, serial: u64) -> Result<InvoiceNumber, MoadianError> {
        InvoiceNumber::encode(serial)
    }
}

/// Build the tax identifier for `serial` issued at `timestamp_ms`.
///
/// Fails with [`MoadianError::Format`] if the day or serial field overflows.
pub fn encode_identifier(
    scope: &FiscalScope,
    timestamp_ms: u64,
    serial: u64,
) -> Result<TaxIdentifier, MoadianError> {
    encode_day(scope, timestamp_ms / MS_PER_DAY, serial)
}

/// Check that `timestamp_ms` fits the day field without building an identifier.
pub fn check_timestamp(timestamp_ms: u64) -> Result<(), MoadianError> {
    format_hex(timestamp_ms / MS_PER_DAY, DAY_WIDTH, "day").map(drop)
}

/// Whether `value` is a well-formed tax identifier with a correct check digit.
pub fn validate_tax_id(value: &str) -> bool {
    TaxIdentifier::parse(value).is_ok()
}

fn encode_day(scope: &FiscalScope, day: u64, serial: u64) -> Result<TaxIdentifier, MoadianError> {
    let invoice_number = InvoiceNumber::encode(serial)?;
    let mut value = String::with_capacity(TAX_ID_LEN);
    value.push_str(scope.as_str());
    value.push_str(&format_hex(day, DAY_WIDTH, "day")?);
    value.push_str(invoice_number.as_str());
    let check = check_digit(&value);
    value.push(char::from(b'0' + check));

    Ok(TaxIdentifier {
        value,
        scope: scope.clone(),
        day,
        invoice_number,
    })
}

fn check_digit(base: &str) -> u8 {
    checksum::compute(&numeric_derivation(base))
}

/// Base-36 value of each character, written out in decimal digits.
fn numeric_derivation(base: &str) -> Vec<u8> {
    let mut digits = Vec::with_capacity(base.len() * 2);
    for c in base.chars() {
        match c.to_digit(36) {
            Some(v) if v >= 10 => {
                digits.push((v / 10) as u8);
                digits.push((v % 10) as u8);
            }
            Some(v) => digits.push(v as u8),
            None => {}
        }
    }
    digits
}
