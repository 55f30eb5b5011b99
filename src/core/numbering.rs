use serde::{Deserialize, Serialize};

use super::error::MoadianError;

/// Width of the hexadecimal invoice number (`inno`).
pub const INVOICE_NUMBER_WIDTH: usize = 10;

/// Largest serial representable in [`INVOICE_NUMBER_WIDTH`] hex digits (16^10 − 1).
pub const MAX_SERIAL: u64 = (1 << (4 * INVOICE_NUMBER_WIDTH)) - 1;

/// Fixed-width hexadecimal invoice number.
///
/// A lossless re-encoding of the serial embedded in the tax identifier:
/// upper-case hex, left-padded with zeros to 10 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber {
    value: String,
    serial: u64,
}

impl InvoiceNumber {
    /// Encode a serial. Fails if it exceeds [`MAX_SERIAL`].
    pub fn encode(serial: u64) -> Result<Self, MoadianError> {
        let value = format_hex(serial, INVOICE_NUMBER_WIDTH, "serial")?;
        Ok(Self { value, serial })
    }

    /// Parse a 10-character hex string (either case).
    pub fn parse(value: &str) -> Result<Self, MoadianError> {
        let serial = parse_hex(value, INVOICE_NUMBER_WIDTH, "invoice number")?;
        Self::encode(serial)
    }

    /// Decode back to the serial.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = MoadianError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> Self {
        number.value
    }
}

/// Render `serial` as the 10-character invoice number.
pub fn encode_invoice_number(serial: u64) -> Result<InvoiceNumber, MoadianError> {
    InvoiceNumber::encode(serial)
}

/// Decode an invoice number string back to its serial.
pub fn decode_invoice_number(value: &str) -> Result<u64, MoadianError> {
    parse_hex(value, INVOICE_NUMBER_WIDTH, "invoice number")
}

/// Upper-case hex, left-padded to `width`. Overflow is an error, never truncated.
pub(crate) fn format_hex(value: u64, width: usize, field: &str) -> Result<String, MoadianError> {
    let encoded = format!("{value:0>width$X}");
    if encoded.len() > width {
        return Err(MoadianError::Format(format!(
            "{field} {value} does not fit in {width} hex digits"
        )));
    }
    Ok(encoded)
}

pub(crate) fn parse_hex(value: &str, width: usize, field: &str) -> Result<u64, MoadianError> {
    if value.len() != width || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(MoadianError::Format(format!(
            "{field} must be {width} hex digits, got '{value}'"
        )));
    }
    u64::from_str_radix(value, 16)
        .map_err(|e| MoadianError::Format(format!("{field} '{value}': {e}")))
}
