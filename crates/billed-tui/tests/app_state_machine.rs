//! State machine tests for the TUI App.
//!
//! Each test builds an App over a shared-handle in-memory store and
//! simulates key events to exercise screen transitions, the upload flow
//! and the submit flow.

use billed_core::{Bill, BillStatus, ExpenseType, Session, UserType};
use billed_store::{BlockingStore, MemoryStore};
use billed_tui::app::{App, Mode, NewBillForm};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn char_key(c: char) -> KeyEvent {
    key(KeyCode::Char(c))
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn session() -> Session {
    Session {
        user_type: UserType::Employee,
        email: "employee@test.tld".into(),
    }
}

/// App over the fixture store, plus a handle kept for inspection.
fn make_app() -> (App, MemoryStore) {
    let store = MemoryStore::with_fixtures();
    let app = App::new(BlockingStore::new(store.clone()), session());
    (app, store)
}

fn type_str(app: &mut App, s: &str) {
    for c in s.chars() {
        app.handle_key(char_key(c));
    }
}

fn form_of(app: &App) -> &NewBillForm {
    match app.mode() {
        Mode::NewBill { form } => form,
        other => panic!("expected the new-bill form, got {other:?}"),
    }
}

/// From the fresh form (category active), Tab down to the file field.
fn tab_to_file(app: &mut App) {
    for _ in 0..7 {
        app.handle_key(key(KeyCode::Tab));
    }
}

/// Fill every field of a fresh form except the file path.
fn fill_fields(app: &mut App) {
    // category: Transports → Restaurants et bars → Hôtel et logement
    app.handle_key(key(KeyCode::Right));
    app.handle_key(key(KeyCode::Right));
    app.handle_key(key(KeyCode::Tab));
    type_str(app, "vol lyon"); // name
    app.handle_key(key(KeyCode::Tab));
    type_str(app, "2022-04-04"); // date
    app.handle_key(key(KeyCode::Tab));
    type_str(app, "400"); // amount
    app.handle_key(key(KeyCode::Tab));
    type_str(app, "80"); // vat
    app.handle_key(key(KeyCode::Tab));
    type_str(app, "20"); // pct
    app.handle_key(key(KeyCode::Tab));
    type_str(app, "séminaire"); // commentary
    app.handle_key(key(KeyCode::Tab)); // file field
}

/// Write a receipt file on disk and return (dir, path-as-typed).
fn receipt_on_disk(name: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, [0xff, 0xd8, 0xff, 0xe0]).unwrap();
    (dir, path.display().to_string())
}

// ---- Bill list ----

#[test]
fn app_starts_on_the_bill_list_with_fixtures() {
    let (app, _store) = make_app();
    assert!(matches!(app.mode(), Mode::Bills));
    assert_eq!(app.rows().len(), 4);
}

#[test]
fn rows_are_ordered_latest_first() {
    let (app, _store) = make_app();
    let dates: Vec<&str> = app.rows().iter().map(|r| r.bill.date.as_str()).collect();
    assert_eq!(
        dates,
        vec!["2004-04-04", "2003-03-03", "2002-02-02", "2001-01-01"]
    );
    assert_eq!(app.rows()[0].date_display, "4 Avr. 04");
    assert_eq!(app.rows()[0].status_display, "En attente");
}

#[test]
fn malformed_date_keeps_the_raw_value() {
    let store = MemoryStore::new();
    store.insert(Bill {
        id: "bad-date".into(),
        email: "a@a".into(),
        expense_type: ExpenseType::Transports,
        name: "taxi".into(),
        amount: 30,
        date: "pas-une-date".into(),
        vat: String::new(),
        pct: 20,
        commentary: String::new(),
        file_url: None,
        file_name: None,
        status: BillStatus::Pending,
    });

    let app = App::new(BlockingStore::new(store), session());
    assert_eq!(app.rows().len(), 1);
    assert_eq!(app.rows()[0].date_display, "pas-une-date");
}

#[test]
fn list_fetch_404_renders_the_error_screen() {
    let store = MemoryStore::with_fixtures();
    store.fail_next_list(404);
    let mut app = App::new(BlockingStore::new(store.clone()), session());

    match app.mode() {
        Mode::BillsError { message } => assert!(message.contains("Erreur 404")),
        other => panic!("expected the error screen, got {other:?}"),
    }

    // retry recovers once the store answers again
    app.handle_key(char_key('r'));
    assert!(matches!(app.mode(), Mode::Bills));
    assert_eq!(app.rows().len(), 4);
}

#[test]
fn list_fetch_500_renders_the_error_screen() {
    let store = MemoryStore::with_fixtures();
    store.fail_next_list(500);
    let app = App::new(BlockingStore::new(store), session());

    match app.mode() {
        Mode::BillsError { message } => assert!(message.contains("Erreur 500")),
        other => panic!("expected the error screen, got {other:?}"),
    }
}

// ---- Navigation ----

#[test]
fn n_opens_the_new_bill_form() {
    let (mut app, _store) = make_app();
    app.handle_key(char_key('n'));
    assert!(matches!(app.mode(), Mode::NewBill { .. }));
    assert!(app.is_input_mode());
}

#[test]
fn esc_returns_to_the_bill_list() {
    let (mut app, _store) = make_app();
    app.handle_key(char_key('n'));
    app.handle_key(key(KeyCode::Esc));
    assert!(matches!(app.mode(), Mode::Bills));
}

#[test]
fn receipt_overlay_opens_and_closes() {
    let (mut app, _store) = make_app();
    app.handle_key(key(KeyCode::Enter));
    match app.mode() {
        Mode::Receipt { file_name, .. } => assert_eq!(file_name, "facture-hotel.jpg"),
        other => panic!("expected the receipt overlay, got {other:?}"),
    }
    app.handle_key(key(KeyCode::Esc));
    assert!(matches!(app.mode(), Mode::Bills));
}

#[test]
fn receipt_overlay_needs_a_file() {
    let (mut app, _store) = make_app();
    // third row (2002-02-02) has no receipt
    app.handle_key(char_key('j'));
    app.handle_key(char_key('j'));
    app.handle_key(key(KeyCode::Enter));
    assert!(matches!(app.mode(), Mode::Bills));
    assert_eq!(
        app.status_message(),
        Some("Aucun justificatif pour cette note")
    );
}

// ---- Receipt upload ----

#[test]
fn valid_jpg_attach_clears_error_enables_submit_and_uploads() {
    let (mut app, store) = make_app();
    let (_dir, path) = receipt_on_disk("facture.jpg");

    app.handle_key(char_key('n'));
    tab_to_file(&mut app);
    type_str(&mut app, &path);
    app.handle_key(key(KeyCode::Enter));

    let form = form_of(&app);
    assert!(form.error.is_none());
    assert!(form.submit_enabled);
    let receipt = form.receipt.as_ref().expect("receipt should be recorded");
    assert_eq!(receipt.file_name, "facture.jpg");
    assert!(!receipt.key.is_empty());
    assert_eq!(store.create_calls(), 1);
    assert_eq!(app.status_message(), Some("Justificatif envoyé"));
}

#[test]
fn pdf_attach_sets_the_error_and_disables_submit() {
    let (mut app, store) = make_app();

    app.handle_key(char_key('n'));
    tab_to_file(&mut app);
    type_str(&mut app, "test.pdf");
    app.handle_key(key(KeyCode::Enter));

    let form = form_of(&app);
    assert!(form.error.as_deref().unwrap_or_default().contains("jpg"));
    assert!(!form.submit_enabled);
    assert!(form.receipt.is_none());
    // the store is never reached for an invalid extension
    assert_eq!(store.create_calls(), 0);
}

#[test]
fn valid_attach_after_an_invalid_one_recovers() {
    let (mut app, store) = make_app();
    let (_dir, path) = receipt_on_disk("facture.png");

    app.handle_key(char_key('n'));
    tab_to_file(&mut app);
    type_str(&mut app, "test.pdf");
    app.handle_key(key(KeyCode::Enter));
    assert!(!form_of(&app).submit_enabled);

    for _ in 0.."test.pdf".len() {
        app.handle_key(key(KeyCode::Backspace));
    }
    type_str(&mut app, &path);
    app.handle_key(key(KeyCode::Enter));

    let form = form_of(&app);
    assert!(form.error.is_none());
    assert!(form.submit_enabled);
    assert_eq!(store.create_calls(), 1);
}

#[test]
fn upload_failure_leaves_the_pending_receipt_unchanged() {
    let (mut app, store) = make_app();
    let (_dir, path) = receipt_on_disk("facture.jpg");
    store.fail_next_create(500);

    app.handle_key(char_key('n'));
    tab_to_file(&mut app);
    type_str(&mut app, &path);
    app.handle_key(key(KeyCode::Enter));

    assert!(form_of(&app).receipt.is_none());
    assert!(app
        .status_message()
        .unwrap_or_default()
        .contains("Erreur 500"));

    // the same file can be re-sent once the store answers
    app.handle_key(key(KeyCode::Enter));
    assert!(form_of(&app).receipt.is_some());
}

// ---- Submission ----

#[test]
fn well_formed_submit_updates_once_and_navigates_to_the_list() {
    let (mut app, store) = make_app();
    let (_dir, path) = receipt_on_disk("facture.jpg");

    app.handle_key(char_key('n'));
    fill_fields(&mut app);
    type_str(&mut app, &path);
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(ctrl('s'));

    assert!(matches!(app.mode(), Mode::Bills));
    assert_eq!(store.update_calls(), 1);
    assert_eq!(app.status_message(), Some("Note de frais envoyée"));

    // the new bill tops the list: latest date, pending status
    assert_eq!(app.rows().len(), 5);
    let submitted = &app.rows()[0].bill;
    assert_eq!(submitted.name, "vol lyon");
    assert_eq!(submitted.expense_type, ExpenseType::HotelEtLogement);
    assert_eq!(submitted.amount, 400);
    assert_eq!(submitted.pct, 20);
    assert_eq!(submitted.status, BillStatus::Pending);
    assert_eq!(submitted.email, "employee@test.tld");
    assert_eq!(submitted.file_name.as_deref(), Some("facture.jpg"));
}

#[test]
fn submit_without_a_receipt_is_blocked() {
    let (mut app, store) = make_app();

    app.handle_key(char_key('n'));
    fill_fields(&mut app);
    app.handle_key(ctrl('s'));

    let form = form_of(&app);
    assert!(form
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("Justificatif"));
    assert_eq!(store.update_calls(), 0);
}

#[test]
fn submit_with_an_unparseable_amount_is_blocked() {
    let (mut app, store) = make_app();
    let (_dir, path) = receipt_on_disk("facture.jpg");

    app.handle_key(char_key('n'));
    app.handle_key(key(KeyCode::Tab)); // name
    app.handle_key(key(KeyCode::Tab)); // date
    type_str(&mut app, "2022-04-04");
    app.handle_key(key(KeyCode::Tab)); // amount
    type_str(&mut app, "4OO");
    for _ in 0..4 {
        app.handle_key(key(KeyCode::Tab)); // vat, pct, commentary, file
    }
    type_str(&mut app, &path);
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(ctrl('s'));

    let form = form_of(&app);
    assert!(form
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("Montant"));
    assert_eq!(store.update_calls(), 0);
}

#[test]
fn submit_failure_blocks_navigation_and_can_be_retried() {
    let (mut app, store) = make_app();
    let (_dir, path) = receipt_on_disk("facture.jpg");

    app.handle_key(char_key('n'));
    fill_fields(&mut app);
    type_str(&mut app, &path);
    app.handle_key(key(KeyCode::Enter));

    store.fail_next_update(500);
    app.handle_key(ctrl('s'));

    assert!(matches!(app.mode(), Mode::NewBill { .. }));
    assert!(app
        .status_message()
        .unwrap_or_default()
        .contains("Erreur 500"));
    assert_eq!(store.update_calls(), 1);

    // the pending receipt survived, so a retry goes through
    app.handle_key(ctrl('s'));
    assert!(matches!(app.mode(), Mode::Bills));
    assert_eq!(store.update_calls(), 2);
}
