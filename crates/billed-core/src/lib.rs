pub mod bill;
pub mod form;
pub mod format;
pub mod receipt;
pub mod session;

pub use bill::{Bill, BillStatus, ExpenseType};
pub use form::{BillForm, FieldError};
pub use receipt::PendingReceipt;
pub use session::{Session, SessionError, UserType};
