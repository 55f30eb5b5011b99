//! Durable per-scope serial counter.
//!
//! One JSON record per fiscal scope lives in a configurable directory. Every
//! `get_next` runs read, increment and persist as one unit under a per-scope
//! in-process mutex and an exclusive advisory lock on a sibling lock file,
//! so threads and independent processes sharing the directory never observe
//! or persist the same `last_serial`.

mod config;
mod counter;
mod store;

pub use config::*;
pub use counter::*;
pub use store::{FileLock, FileRecordStore, RecordStore, SerialRecord};
