use billed_core::Bill;
use tokio::runtime::Runtime;

use crate::{BillStore, CreatedBill, ReceiptUpload, StoreError};

/// Blocking wrapper around a `BillStore`.
///
/// Creates an internal tokio runtime and uses `block_on()` for each call.
/// Designed for sync callers like the TUI, which processes one key event
/// at a time: a store call always runs to completion before the next
/// event is handled.
pub struct BlockingStore {
    inner: Box<dyn BillStore>,
    rt: Runtime,
}

impl BlockingStore {
    pub fn new(inner: impl BillStore + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            rt: Runtime::new().expect("failed to create tokio runtime"),
        }
    }

    pub fn list_bills(&self) -> Result<Vec<Bill>, StoreError> {
        self.rt.block_on(self.inner.list_bills())
    }

    pub fn create_bill(&self, upload: &ReceiptUpload) -> Result<CreatedBill, StoreError> {
        self.rt.block_on(self.inner.create_bill(upload))
    }

    pub fn update_bill(&self, key: &str, bill: &Bill) -> Result<Bill, StoreError> {
        self.rt.block_on(self.inner.update_bill(key, bill))
    }

    pub fn health_check(&self) -> Result<(), StoreError> {
        self.rt.block_on(self.inner.health_check())
    }
}
