mod blocking;
mod http;
mod memory;
mod traits;

pub use blocking::BlockingStore;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use traits::{BillStore, CreatedBill, ReceiptUpload, StoreError};
