use async_trait::async_trait;
use billed_core::Bill;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP-equivalent rejection. The rendered message keeps the literal
    /// "Erreur {code}" wording the error screen shows.
    #[error("Erreur {code}: {message}")]
    Status { code: u16, message: String },

    #[error("connexion impossible: {0}")]
    Connection(String),

    #[error("réponse illisible: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn code(&self) -> Option<u16> {
        match self {
            StoreError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Some(404)
    }
}

/// Multipart payload for the receipt upload: the file bytes plus the
/// submitting employee's email.
#[derive(Debug, Clone)]
pub struct ReceiptUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub email: String,
}

/// What the store hands back for a successful receipt upload: where the
/// file landed and the opaque key identifying the in-progress bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBill {
    pub file_url: String,
    pub key: String,
}

/// Abstraction over remote bill persistence.
///
/// The TUI programs against this trait. `HttpStore` talks to the real
/// backend; `MemoryStore` backs the tests and the offline demo mode.
#[async_trait]
pub trait BillStore: Send + Sync {
    async fn list_bills(&self) -> Result<Vec<Bill>, StoreError>;

    async fn create_bill(&self, upload: &ReceiptUpload) -> Result<CreatedBill, StoreError>;

    async fn update_bill(&self, key: &str, bill: &Bill) -> Result<Bill, StoreError>;

    /// Reachability probe. Stores without a transport always pass.
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
