//! Pure validation for the create-bill form.
//!
//! The form is a plain bag of input strings; validation turns it into a
//! submittable [`Bill`] or a list of typed field errors. No store call is
//! ever made from here, and no widget state leaks in.

use thiserror::Error;

use crate::bill::{Bill, BillStatus, ExpenseType};
use crate::receipt::PendingReceipt;

/// Percentage applied when the field is left empty.
pub const DEFAULT_PCT: i64 = 20;

/// Raw field values as typed by the user, one string per named field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillForm {
    pub expense_type: String,
    pub name: String,
    pub amount: String,
    pub date: String,
    pub vat: String,
    pub pct: String,
    pub commentary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Category,
    Name,
    Amount,
    Date,
    Vat,
    Pct,
    Commentary,
    Receipt,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Category => "Type de dépense",
            Field::Name => "Nom de la dépense",
            Field::Amount => "Montant TTC",
            Field::Date => "Date",
            Field::Vat => "TVA",
            Field::Pct => "Pourcentage",
            Field::Commentary => "Commentaire",
            Field::Receipt => "Justificatif",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{}: champ requis", .0.label())]
    Required(Field),

    #[error("{}: nombre invalide", .0.label())]
    NotANumber(Field),

    #[error("catégorie inconnue: {0}")]
    UnknownCategory(String),
}

/// Validate the form and assemble the pending bill.
///
/// Required: category, date, amount, percentage (defaulted when empty) and
/// an uploaded receipt. Name, VAT and commentary are free-form. An
/// unparseable number is a typed error, never a silent default.
pub fn validate(
    form: &BillForm,
    receipt: Option<&PendingReceipt>,
    email: &str,
) -> Result<Bill, Vec<FieldError>> {
    let mut errors = Vec::new();

    let expense_type = match form.expense_type.trim() {
        "" => {
            errors.push(FieldError::Required(Field::Category));
            None
        }
        raw => match ExpenseType::from_str(raw) {
            Some(t) => Some(t),
            None => {
                errors.push(FieldError::UnknownCategory(raw.to_string()));
                None
            }
        },
    };

    if form.date.trim().is_empty() {
        errors.push(FieldError::Required(Field::Date));
    }

    let amount = match form.amount.trim() {
        "" => {
            errors.push(FieldError::Required(Field::Amount));
            None
        }
        raw => match raw.parse::<i64>() {
            Ok(v) => Some(v),
            Err(_) => {
                errors.push(FieldError::NotANumber(Field::Amount));
                None
            }
        },
    };

    let pct = match form.pct.trim() {
        "" => Some(DEFAULT_PCT),
        raw => match raw.parse::<i64>() {
            Ok(v) => Some(v),
            Err(_) => {
                errors.push(FieldError::NotANumber(Field::Pct));
                None
            }
        },
    };

    if receipt.is_none() {
        errors.push(FieldError::Required(Field::Receipt));
    }

    match (expense_type, amount, pct, receipt) {
        (Some(expense_type), Some(amount), Some(pct), Some(receipt)) if errors.is_empty() => {
            Ok(Bill {
                id: receipt.key.clone(),
                email: email.to_string(),
                expense_type,
                name: form.name.trim().to_string(),
                amount,
                date: form.date.trim().to_string(),
                vat: form.vat.trim().to_string(),
                pct,
                commentary: form.commentary.trim().to_string(),
                file_url: Some(receipt.file_url.clone()),
                file_name: Some(receipt.file_name.clone()),
                status: BillStatus::Pending,
            })
        }
        _ => Err(errors),
    }
}
