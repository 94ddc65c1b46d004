use billed_core::{format, Bill};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Row, Table, TableState};

/// One displayable bill: the record plus its formatted columns.
#[derive(Debug, Clone)]
pub struct BillRow {
    pub bill: Bill,
    pub date_display: String,
    pub status_display: &'static str,
}

impl BillRow {
    /// Format a record for display. A date the formatter cannot parse is
    /// kept raw; one bad record must not sink the whole list.
    pub fn from_bill(bill: Bill) -> Self {
        let date_display = match format::format_date(&bill.date) {
            Ok(formatted) => formatted,
            Err(e) => {
                tracing::warn!(date = %bill.date, error = %e, "unparseable bill date, keeping raw value");
                bill.date.clone()
            }
        };
        let status_display = bill.status.display_name();
        Self {
            bill,
            date_display,
            status_display,
        }
    }
}

pub struct BillTable {
    rows: Vec<BillRow>,
    state: TableState,
}

impl BillTable {
    pub fn new(rows: Vec<BillRow>) -> Self {
        let mut state = TableState::default();
        if !rows.is_empty() {
            state.select(Some(0));
        }
        Self { rows, state }
    }

    pub fn rows(&self) -> &[BillRow] {
        &self.rows
    }

    pub fn selected_row(&self) -> Option<&BillRow> {
        let idx = self.state.selected()?;
        self.rows.get(idx)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let current = self.state.selected().unwrap_or(0);
                if current + 1 < self.rows.len() {
                    self.state.select(Some(current + 1));
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let current = self.state.selected().unwrap_or(0);
                if current > 0 {
                    self.state.select(Some(current - 1));
                }
            }
            // Jump to first/last
            KeyCode::Char('g') => {
                if !self.rows.is_empty() {
                    self.state.select(Some(0));
                }
            }
            KeyCode::Char('G') => {
                if !self.rows.is_empty() {
                    self.state.select(Some(self.rows.len() - 1));
                }
            }
            _ => {}
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let header = Row::new(["Type", "Nom", "Date", "Montant", "Statut", "Justificatif"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|row| {
                Row::new([
                    row.bill.expense_type.as_str().to_string(),
                    row.bill.name.clone(),
                    row.date_display.clone(),
                    format!("{} €", row.bill.amount),
                    row.status_display.to_string(),
                    if row.bill.file_url.is_some() {
                        "(v) voir".to_string()
                    } else {
                        String::new()
                    },
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(24),
            Constraint::Min(12),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(14),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Mes notes de frais"),
            )
            .row_highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");

        frame.render_stateful_widget(table, area, &mut self.state);
    }
}
