use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::config::SerialStoreConfig;
use super::store::{FileRecordStore, RecordStore, SerialRecord};
use crate::core::{
    FiscalScope, InvoiceNumber, MAX_SERIAL, MoadianError, TaxIdentifier, check_timestamp,
    encode_identifier,
};

/// Durable, per-scope monotonic serial counter.
///
/// `get_next` is a single critical section per scope: an in-process mutex
/// plus the store's cross-process lock are held while the record is read,
/// incremented and persisted. The new serial is returned only after the
/// store reports it durable; on any error the stored value is unchanged and
/// the call may be retried. Scopes never block each other.
pub struct SerialCounter<S: RecordStore = FileRecordStore> {
    store: S,
    start: u64,
    scopes: Mutex<HashMap<FiscalScope, Arc<Mutex<()>>>>,
}

/// Identifiers issued together for one serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub serial: u64,
    pub tax_id: TaxIdentifier,
    pub invoice_number: InvoiceNumber,
}

impl SerialCounter<FileRecordStore> {
    /// File-backed counter as described by `config`.
    pub fn new(config: SerialStoreConfig) -> Self {
        Self::with_store(FileRecordStore::new(config.directory), config.start)
    }
}

impl<S: RecordStore> SerialCounter<S> {
    pub fn with_store(store: S, start: u64) -> Self {
        Self {
            store,
            start,
            scopes: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Issue the next serial for `scope`.
    pub fn get_next(&self, scope: &FiscalScope) -> Result<u64, MoadianError> {
        let scope_mutex = self.scope_mutex(scope);
        let _local = scope_mutex.lock();
        let _lock = self.store.lock(scope)?;

        let current = self.store.load(scope)?;
        let serial = self.successor(scope, current.as_ref())?;

        self.store.persist(&SerialRecord {
            fiscal_scope: scope.clone(),
            last_serial: serial,
        })?;

        if current.is_none() {
            info!(scope = %scope, serial, "seeded serial record");
        }
        debug!(scope = %scope, serial, "serial persisted");
        Ok(serial)
    }

    /// Parse `scope` and issue its next serial.
    pub fn get_next_str(&self, scope: &str) -> Result<u64, MoadianError> {
        self.get_next(&FiscalScope::parse(scope)?)
    }

    /// The serial the next `get_next` would return, without consuming it.
    pub fn peek(&self, scope: &FiscalScope) -> Result<u64, MoadianError> {
        let scope_mutex = self.scope_mutex(scope);
        let _local = scope_mutex.lock();
        let _lock = self.store.lock(scope)?;
        let current = self.store.load(scope)?;
        self.successor(scope, current.as_ref())
    }

    /// Last serial issued for `scope`, if any.
    pub fn last_issued(&self, scope: &FiscalScope) -> Result<Option<u64>, MoadianError> {
        let scope_mutex = self.scope_mutex(scope);
        let _local = scope_mutex.lock();
        let _lock = self.store.lock(scope)?;
        Ok(self.store.load(scope)?.map(|r| r.last_serial))
    }

    /// Draw one serial and encode both identifiers from it.
    ///
    /// The timestamp is checked before a serial is consumed, and serials are
    /// capped at [`MAX_SERIAL`], so encoding cannot fail after the draw.
    pub fn issue(&self, scope: &FiscalScope, timestamp_ms: u64) -> Result<Issuance, MoadianError> {
        check_timestamp(timestamp_ms)?;
        let serial = self.get_next(scope)?;
        let tax_id = encode_identifier(scope, timestamp_ms, serial)?;
        let invoice_number = tax_id.invoice_number().clone();
        Ok(Issuance {
            serial,
            tax_id,
            invoice_number,
        })
    }

    fn successor(
        &self,
        scope: &FiscalScope,
        current: Option<&SerialRecord>,
    ) -> Result<u64, MoadianError> {
        let next = match current {
            None => self.start,
            Some(record) => record.last_serial.checked_add(1).ok_or_else(|| {
                MoadianError::Format(format!("serial space exhausted for scope {scope}"))
            })?,
        };
        if next > MAX_SERIAL {
            return Err(MoadianError::Format(format!(
                "serial {next} for scope {scope} exceeds {MAX_SERIAL}"
            )));
        }
        Ok(next)
    }

    fn scope_mutex(&self, scope: &FiscalScope) -> Arc<Mutex<()>> {
        self.scopes
            .lock()
            .entry(scope.clone())
            .or_default()
            .clone()
    }
}
