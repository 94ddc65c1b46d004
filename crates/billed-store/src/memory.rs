use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use billed_core::{Bill, BillStatus, ExpenseType};
use uuid::Uuid;

use crate::{BillStore, CreatedBill, ReceiptUpload, StoreError};

/// In-memory `BillStore` backing the tests and the offline demo mode.
///
/// Handles are cheap clones over shared state, so a test can keep one and
/// inspect or sabotage the store after handing another to the app.
#[derive(Clone, Default)]
pub struct MemoryStore {
    bills: Arc<Mutex<Vec<Bill>>>,
    fail_next_list: Arc<Mutex<Option<u16>>>,
    fail_next_create: Arc<Mutex<Option<u16>>>,
    fail_next_update: Arc<Mutex<Option<u16>>>,
    create_calls: Arc<AtomicUsize>,
    update_calls: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with the four demo bills.
    pub fn with_fixtures() -> Self {
        let store = Self::new();
        store
            .bills
            .lock()
            .unwrap()
            .extend(fixture_bills());
        store
    }

    /// Seed a record directly, bypassing the upload flow.
    pub fn insert(&self, bill: Bill) {
        self.bills.lock().unwrap().push(bill);
    }

    /// Make the next `list_bills` call reject with an HTTP-equivalent status.
    pub fn fail_next_list(&self, code: u16) {
        *self.fail_next_list.lock().unwrap() = Some(code);
    }

    /// Make the next `create_bill` call reject with an HTTP-equivalent status.
    pub fn fail_next_create(&self, code: u16) {
        *self.fail_next_create.lock().unwrap() = Some(code);
    }

    /// Make the next `update_bill` call reject with an HTTP-equivalent status.
    pub fn fail_next_update(&self, code: u16) {
        *self.fail_next_update.lock().unwrap() = Some(code);
    }

    pub fn bills(&self) -> Vec<Bill> {
        self.bills.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

fn take_failure(slot: &Mutex<Option<u16>>) -> Option<StoreError> {
    slot.lock().unwrap().take().map(|code| StoreError::Status {
        code,
        message: reason_phrase(code).to_string(),
    })
}

fn reason_phrase(code: u16) -> &'static str {
    match code {
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    }
}

#[async_trait]
impl BillStore for MemoryStore {
    async fn list_bills(&self) -> Result<Vec<Bill>, StoreError> {
        if let Some(err) = take_failure(&self.fail_next_list) {
            return Err(err);
        }
        Ok(self.bills.lock().unwrap().clone())
    }

    async fn create_bill(&self, upload: &ReceiptUpload) -> Result<CreatedBill, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = take_failure(&self.fail_next_create) {
            return Err(err);
        }
        let key = Uuid::new_v4().to_string();
        Ok(CreatedBill {
            file_url: format!("memory://receipts/{key}/{}", upload.file_name),
            key,
        })
    }

    async fn update_bill(&self, key: &str, bill: &Bill) -> Result<Bill, StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = take_failure(&self.fail_next_update) {
            return Err(err);
        }
        let mut stored = bill.clone();
        stored.id = key.to_string();

        let mut bills = self.bills.lock().unwrap();
        match bills.iter_mut().find(|b| b.id == key) {
            Some(existing) => *existing = stored.clone(),
            None => bills.push(stored.clone()),
        }
        Ok(stored)
    }
}

fn fixture_bills() -> Vec<Bill> {
    vec![
        Bill {
            id: "47qAXb6fIm2zOKkLzMro".into(),
            email: "a@a".into(),
            expense_type: ExpenseType::HotelEtLogement,
            name: "encore".into(),
            amount: 400,
            date: "2004-04-04".into(),
            vat: "80".into(),
            pct: 20,
            commentary: "séminaire billed".into(),
            file_url: Some("https://storage.example/justificatifs/facture-hotel.jpg".into()),
            file_name: Some("facture-hotel.jpg".into()),
            status: BillStatus::Pending,
        },
        Bill {
            id: "BeKy5Mo4jkmdfPGYpTxZ".into(),
            email: "a@a".into(),
            expense_type: ExpenseType::Transports,
            name: "test1".into(),
            amount: 100,
            date: "2001-01-01".into(),
            vat: String::new(),
            pct: 20,
            commentary: "plop".into(),
            file_url: Some("https://storage.example/justificatifs/billet-train.jpg".into()),
            file_name: Some("billet-train.jpg".into()),
            status: BillStatus::Refused,
        },
        Bill {
            id: "UIUZtnPQvnbFnB0ozvJh".into(),
            email: "a@a".into(),
            expense_type: ExpenseType::ServicesEnLigne,
            name: "test3".into(),
            amount: 300,
            date: "2003-03-03".into(),
            vat: "60".into(),
            pct: 20,
            commentary: String::new(),
            file_url: Some("https://storage.example/justificatifs/abonnement.png".into()),
            file_name: Some("abonnement.png".into()),
            status: BillStatus::Accepted,
        },
        Bill {
            id: "qcCK3SzECmaZAGRrHjaC".into(),
            email: "a@a".into(),
            expense_type: ExpenseType::RestaurantsEtBars,
            name: "test2".into(),
            amount: 200,
            date: "2002-02-02".into(),
            vat: "40".into(),
            pct: 20,
            commentary: "repas client".into(),
            file_url: None,
            file_name: None,
            status: BillStatus::Refused,
        },
    ]
}
