use std::path::Path;

use billed_core::form::{self, BillForm};
use billed_core::receipt::{self, PendingReceipt};
use billed_core::{Bill, ExpenseType, Session};
use billed_store::{BlockingStore, ReceiptUpload, StoreError};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::components::bill_table::{BillRow, BillTable};

/// Screens the client can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Bills,
    NewBill,
}

/// What the app is currently showing
#[derive(Debug, Clone)]
pub enum Mode {
    /// Bill list (landing screen)
    Bills,
    /// Bill list fetch failed; error banner until re-navigation
    BillsError { message: String },
    /// Receipt preview overlay for one bill
    Receipt { file_name: String, file_url: String },
    /// New bill form
    NewBill { form: NewBillForm },
}

/// Editable fields of the create-bill form, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Category,
    Name,
    Date,
    Amount,
    Vat,
    Pct,
    Commentary,
    File,
}

impl FormField {
    pub const ALL: &[FormField] = &[
        FormField::Category,
        FormField::Name,
        FormField::Date,
        FormField::Amount,
        FormField::Vat,
        FormField::Pct,
        FormField::Commentary,
        FormField::File,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Category => "Type de dépense",
            FormField::Name => "Nom de la dépense",
            FormField::Date => "Date (AAAA-MM-JJ)",
            FormField::Amount => "Montant TTC",
            FormField::Vat => "TVA",
            FormField::Pct => "%",
            FormField::Commentary => "Commentaire",
            FormField::File => "Justificatif (chemin du fichier)",
        }
    }

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// State of the create-bill form between key events.
#[derive(Debug, Clone)]
pub struct NewBillForm {
    pub expense_type: ExpenseType,
    pub name: String,
    pub date: String,
    pub amount: String,
    pub vat: String,
    pub pct: String,
    pub commentary: String,
    pub file_path: String,
    pub active: FormField,
    /// Inline error shown under the form.
    pub error: Option<String>,
    pub submit_enabled: bool,
    /// Set by a successful receipt upload; carried into the submit.
    pub receipt: Option<PendingReceipt>,
}

impl NewBillForm {
    fn new() -> Self {
        Self {
            expense_type: ExpenseType::Transports,
            name: String::new(),
            date: String::new(),
            amount: String::new(),
            vat: String::new(),
            pct: String::new(),
            commentary: String::new(),
            file_path: String::new(),
            active: FormField::Category,
            error: None,
            submit_enabled: true,
            receipt: None,
        }
    }

    fn active_text_mut(&mut self) -> Option<&mut String> {
        match self.active {
            FormField::Category => None,
            FormField::Name => Some(&mut self.name),
            FormField::Date => Some(&mut self.date),
            FormField::Amount => Some(&mut self.amount),
            FormField::Vat => Some(&mut self.vat),
            FormField::Pct => Some(&mut self.pct),
            FormField::Commentary => Some(&mut self.commentary),
            FormField::File => Some(&mut self.file_path),
        }
    }

    fn field_value(&self, field: FormField) -> String {
        match field {
            FormField::Category => self.expense_type.as_str().to_string(),
            FormField::Name => self.name.clone(),
            FormField::Date => self.date.clone(),
            FormField::Amount => self.amount.clone(),
            FormField::Vat => self.vat.clone(),
            FormField::Pct => self.pct.clone(),
            FormField::Commentary => self.commentary.clone(),
            FormField::File => self.file_path.clone(),
        }
    }

    fn as_input(&self) -> BillForm {
        BillForm {
            expense_type: self.expense_type.as_str().to_string(),
            name: self.name.clone(),
            amount: self.amount.clone(),
            date: self.date.clone(),
            vat: self.vat.clone(),
            pct: self.pct.clone(),
            commentary: self.commentary.clone(),
        }
    }
}

pub struct App {
    store: BlockingStore,
    session: Session,
    table: BillTable,
    mode: Mode,
    status_message: Option<String>,
}

impl App {
    pub fn new(store: BlockingStore, session: Session) -> Self {
        let mut app = Self {
            store,
            session,
            table: BillTable::new(Vec::new()),
            mode: Mode::Bills,
            status_message: None,
        };
        app.navigate(Route::Bills);
        app
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn rows(&self) -> &[BillRow] {
        self.table.rows()
    }

    pub fn is_input_mode(&self) -> bool {
        matches!(self.mode, Mode::NewBill { .. })
    }

    /// Render the screen bound to `route`.
    ///
    /// List fetches happen here, at the navigation boundary, and run to
    /// completion before the mode changes; a store response can never land
    /// on a screen that is no longer mounted.
    pub fn navigate(&mut self, route: Route) {
        match route {
            Route::Bills => match self.load_bills() {
                Ok(rows) => {
                    self.table = BillTable::new(rows);
                    self.mode = Mode::Bills;
                }
                Err(e) => {
                    tracing::error!(error = %e, "bill list fetch failed");
                    self.mode = Mode::BillsError {
                        message: e.to_string(),
                    };
                }
            },
            Route::NewBill => {
                self.mode = Mode::NewBill {
                    form: NewBillForm::new(),
                };
            }
        }
    }

    /// Fetch and format the bill list, newest first.
    fn load_bills(&self) -> Result<Vec<BillRow>, StoreError> {
        let mut rows: Vec<BillRow> = self
            .store
            .list_bills()?
            .into_iter()
            .map(BillRow::from_bill)
            .collect();
        rows.sort_by(|a, b| b.bill.date.cmp(&a.bill.date));
        Ok(rows)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;

        match &self.mode.clone() {
            Mode::Bills => self.handle_bills(key),
            Mode::BillsError { .. } => self.handle_bills_error(key),
            Mode::Receipt { .. } => self.handle_receipt(key),
            Mode::NewBill { form } => self.handle_new_bill(key, form.clone()),
        }
    }

    fn handle_bills(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') => self.navigate(Route::NewBill),
            KeyCode::Char('r') => self.navigate(Route::Bills),
            KeyCode::Char('v') | KeyCode::Enter => self.open_receipt(),
            _ => self.table.handle_key(key),
        }
    }

    /// Show the selected bill's receipt in an overlay.
    fn open_receipt(&mut self) {
        let Some((file_url, file_name)) = self
            .table
            .selected_row()
            .map(|row| (row.bill.file_url.clone(), row.bill.file_name.clone()))
        else {
            return;
        };
        match file_url {
            Some(url) => {
                self.mode = Mode::Receipt {
                    file_url: url,
                    file_name: file_name.unwrap_or_else(|| "justificatif".into()),
                };
            }
            None => {
                self.status_message = Some("Aucun justificatif pour cette note".into());
            }
        }
    }

    fn handle_bills_error(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Enter => self.navigate(Route::Bills),
            _ => {}
        }
    }

    fn handle_receipt(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => self.mode = Mode::Bills,
            _ => {}
        }
    }

    fn handle_new_bill(&mut self, key: KeyEvent, mut form: NewBillForm) {
        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit(form);
            }
            KeyCode::Esc => self.navigate(Route::Bills),
            KeyCode::Tab | KeyCode::Down => {
                form.active = form.active.next();
                self.mode = Mode::NewBill { form };
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.active = form.active.prev();
                self.mode = Mode::NewBill { form };
            }
            KeyCode::Left if form.active == FormField::Category => {
                form.expense_type = cycle_expense_type(form.expense_type, -1);
                self.mode = Mode::NewBill { form };
            }
            KeyCode::Right if form.active == FormField::Category => {
                form.expense_type = cycle_expense_type(form.expense_type, 1);
                self.mode = Mode::NewBill { form };
            }
            KeyCode::Enter if form.active == FormField::File => {
                self.attach_receipt(form);
            }
            KeyCode::Enter => {
                form.active = form.active.next();
                self.mode = Mode::NewBill { form };
            }
            KeyCode::Backspace => {
                if let Some(text) = form.active_text_mut() {
                    text.pop();
                }
                self.mode = Mode::NewBill { form };
            }
            KeyCode::Char(c) => {
                if let Some(text) = form.active_text_mut() {
                    text.push(c);
                }
                self.mode = Mode::NewBill { form };
            }
            _ => {}
        }
    }

    /// Validate and upload the receipt named in the file field.
    ///
    /// A valid extension clears the inline error, re-enables submission and
    /// uploads immediately; an invalid one disables submission and never
    /// reaches the store.
    fn attach_receipt(&mut self, mut form: NewBillForm) {
        let path_value = form.file_path.trim().to_string();
        let fallback = Path::new(&path_value)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let file_name = receipt::file_name_from_path(&path_value, fallback);

        if !receipt::has_allowed_extension(&file_name) {
            form.submit_enabled = false;
            form.error = Some(format!(
                "Seuls les fichiers {} sont acceptés",
                receipt::ALLOWED_EXTENSIONS.join(", ")
            ));
            self.mode = Mode::NewBill { form };
            return;
        }

        form.error = None;
        form.submit_enabled = true;

        let bytes = match std::fs::read(&path_value) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.status_message = Some(format!("Lecture du fichier impossible: {e}"));
                self.mode = Mode::NewBill { form };
                return;
            }
        };

        let upload = ReceiptUpload {
            file_name: file_name.clone(),
            bytes,
            email: self.session.email.clone(),
        };
        match self.store.create_bill(&upload) {
            Ok(created) => {
                form.receipt = Some(PendingReceipt {
                    key: created.key,
                    file_url: created.file_url,
                    file_name,
                });
                self.status_message = Some("Justificatif envoyé".into());
            }
            Err(e) => {
                tracing::error!(error = %e, "receipt upload failed");
                self.status_message = Some(format!("Échec de l'envoi du justificatif: {e}"));
            }
        }
        self.mode = Mode::NewBill { form };
    }

    /// Validate the form, assemble the pending bill and hand it to the
    /// store. Navigation back to the list happens only on success.
    fn submit(&mut self, mut form: NewBillForm) {
        if !form.submit_enabled {
            self.mode = Mode::NewBill { form };
            return;
        }

        let bill = match form::validate(&form.as_input(), form.receipt.as_ref(), &self.session.email)
        {
            Ok(bill) => bill,
            Err(errors) => {
                form.error = Some(
                    errors
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join("; "),
                );
                self.mode = Mode::NewBill { form };
                return;
            }
        };

        self.submit_bill(bill, form);
    }

    fn submit_bill(&mut self, bill: Bill, form: NewBillForm) {
        match self.store.update_bill(&bill.id, &bill) {
            Ok(_) => {
                self.navigate(Route::Bills);
                self.status_message = Some("Note de frais envoyée".into());
            }
            Err(e) => {
                tracing::error!(error = %e, "bill submission failed");
                self.status_message = Some(format!("Échec de l'envoi: {e}"));
                self.mode = Mode::NewBill { form };
            }
        }
    }

    // -- Rendering --

    pub fn render(&mut self, frame: &mut Frame) {
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let title = Line::from(vec![
            Span::styled("Billed", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  {}", self.session.email)),
        ]);
        frame.render_widget(Paragraph::new(title), header);

        match &self.mode.clone() {
            Mode::Bills => {
                self.table.render(frame, body);
                self.render_footer(frame, footer, "n: nouvelle note  v: justificatif  r: rafraîchir  q: quitter");
            }
            Mode::BillsError { message } => {
                let text = Text::from(vec![
                    Line::raw(""),
                    Line::styled(message.clone(), Style::default().fg(Color::Red)),
                    Line::raw(""),
                    Line::raw("r: réessayer"),
                ]);
                frame.render_widget(
                    Paragraph::new(text)
                        .block(Block::default().borders(Borders::ALL).title("Erreur"))
                        .wrap(Wrap { trim: true }),
                    body,
                );
                self.render_footer(frame, footer, "r: réessayer  q: quitter");
            }
            Mode::Receipt {
                file_name,
                file_url,
            } => {
                self.table.render(frame, body);
                let popup = centered_rect(60, 40, body);
                frame.render_widget(Clear, popup);
                let text = Text::from(vec![
                    Line::styled(
                        file_name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Line::raw(""),
                    Line::raw(file_url.clone()),
                ]);
                frame.render_widget(
                    Paragraph::new(text)
                        .block(Block::default().borders(Borders::ALL).title("Justificatif"))
                        .wrap(Wrap { trim: true }),
                    popup,
                );
                self.render_footer(frame, footer, "Échap: fermer");
            }
            Mode::NewBill { form } => {
                self.render_form(frame, body, form);
                self.render_footer(
                    frame,
                    footer,
                    "Tab: champ suivant  Entrée (justificatif): envoyer le fichier  Ctrl+S: envoyer  Échap: retour",
                );
            }
        }
    }

    fn render_form(&self, frame: &mut Frame, area: Rect, form: &NewBillForm) {
        let mut lines: Vec<Line> = Vec::new();
        for &field in FormField::ALL {
            let marker = if field == form.active { "> " } else { "  " };
            let value = match field {
                FormField::Category => format!("< {} >", form.expense_type),
                _ => form.field_value(field),
            };
            let style = if field == form.active {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::styled(
                format!("{marker}{}: {value}", field.label()),
                style,
            ));
        }

        lines.push(Line::raw(""));
        match &form.receipt {
            Some(receipt) => lines.push(Line::styled(
                format!("Justificatif envoyé: {}", receipt.file_name),
                Style::default().fg(Color::Green),
            )),
            None => lines.push(Line::raw("Aucun justificatif envoyé")),
        }
        if let Some(error) = &form.error {
            lines.push(Line::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            ));
        }
        if !form.submit_enabled {
            lines.push(Line::styled(
                "Envoi désactivé",
                Style::default().fg(Color::DarkGray),
            ));
        }

        frame.render_widget(
            Paragraph::new(Text::from(lines)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Envoyer une note de frais"),
            ),
            area,
        );
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, hints: &str) {
        let line = match &self.status_message {
            Some(message) => Line::styled(message.clone(), Style::default().fg(Color::Yellow)),
            None => Line::styled(hints.to_string(), Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn cycle_expense_type(current: ExpenseType, step: isize) -> ExpenseType {
    let types = ExpenseType::ALL;
    let idx = types.iter().position(|t| *t == current).unwrap_or(0) as isize;
    let next = (idx + step).rem_euclid(types.len() as isize) as usize;
    types[next]
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(r);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
