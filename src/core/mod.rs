//! Core identifier and amount types.
//!
//! Everything here is a pure function of its inputs and safe to call from
//! any number of threads without coordination.

mod amounts;
mod builder;
pub mod checksum;
mod error;
mod numbering;
mod taxid;
mod types;

pub use amounts::*;
pub use builder::*;
pub use error::*;
pub use numbering::*;
pub use taxid::*;
pub use types::*;
