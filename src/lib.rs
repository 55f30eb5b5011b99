//! # moadian
//!
//! Identifier generation and serial management for invoices submitted to the
//! Iranian tax-document service (Moadian).
//!
//! The service rejects any invoice whose tax identifier collides with an
//! earlier one or fails its embedded check digit, and recomputes every
//! monetary amount. This crate provides the pieces that must match it exactly:
//!
//! - a durable, per-scope serial counter that never reissues a serial,
//! - the Verhoeff check-digit variant the service accepts,
//! - the 22-character tax identifier and the 10-character hexadecimal
//!   invoice number, both bound to the same serial,
//! - per-line and per-invoice VAT arithmetic (sum of rounded lines).
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use moadian::core::*;
//! use rust_decimal_macros::dec;
//!
//! let scope = FiscalScope::parse("A3NFZT").unwrap();
//! let tax_id = encode_identifier(&scope, 1_700_000_000_000, 42).unwrap();
//! assert_eq!(tax_id.as_str(), "A3NFZT04CDB000000002A8");
//! assert_eq!(encode_invoice_number(42).unwrap().as_str(), "000000002A");
//!
//! let calc = AmountCalculator::new();
//! let line = LineItemBuilder::new("2330004219206", "Consulting", dec!(100000))
//!     .quantity(dec!(2))
//!     .vat_rate(dec!(9))
//!     .build(&calc)
//!     .unwrap();
//! let totals = calc.compute_invoice(&[line]).unwrap();
//! assert_eq!(totals.grand_total, dec!(218000));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Fiscal scope, check digit, tax identifier, invoice number, amounts |
//! | `serial` (default) | File-backed serial counter with in-process and advisory file locking |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "serial")]
pub mod serial;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;

#[cfg(feature = "serial")]
pub use crate::serial::*;
