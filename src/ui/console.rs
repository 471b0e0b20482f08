// ABOUTME: Main console layout, rendering and key handling
// Tabs over the loan resources with a transient status overlay in the corner

use crate::app::state::{AppState, Tab};
use crate::data::collector::DataCollector;
use crate::data::models::{LoanStatus, Record, ResourceKind};
use crate::status::{Status, StatusKind, StatusNotifier};
use crate::ui::form::{FormOutcome, FormPurpose, FormState};
use crate::utils::format::{format_amount, format_optional, truncate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Browse,
    Form(FormState),
    ConfirmDelete { kind: ResourceKind, id: i64 },
}

pub struct Console {
    state: Arc<AppState>,
    collector: DataCollector,
    notifier: StatusNotifier,
    mode: Mode,
    show_help: bool,
}

impl Console {
    pub fn new(state: Arc<AppState>, collector: DataCollector, notifier: StatusNotifier) -> Self {
        Self {
            state,
            collector,
            notifier,
            mode: Mode::Browse,
            show_help: false,
        }
    }

    /// Loads the initial tab.
    pub fn start(&self) {
        self.collector.refresh(self.state.active_tab());
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn notifier(&self) -> &StatusNotifier {
        &self.notifier
    }

    pub fn render(&self, frame: &mut Frame) {
        let size = frame.size();

        // Main layout: header, tabs, body, footer
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Tabs
                Constraint::Min(0),    // Body
                Constraint::Length(3), // Footer
            ])
            .split(size);

        self.render_header(frame, chunks[0]);
        self.render_tabs(frame, chunks[1]);
        self.render_body(frame, chunks[2]);
        self.render_footer(frame, chunks[3]);

        match &self.mode {
            Mode::Form(form) => self.render_form(frame, size, form),
            Mode::ConfirmDelete { kind, id } => self.render_confirm(frame, size, *kind, *id),
            Mode::Browse => {}
        }

        if self.show_help {
            self.render_help_overlay(frame, size);
        }

        // Status sits above everything else
        if let Some(status) = self.notifier.visible() {
            self.render_status(frame, size, &status);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let (activity, activity_color) = if self.state.is_loading() {
            ("Loading...", Color::Yellow)
        } else {
            ("Ready", Color::Green)
        };

        let header_text = vec![
            Span::styled(
                "Home Loan Management System",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  ["),
            Span::styled(
                self.state.config.api_base_url.clone(),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("] ["),
            Span::styled(activity, Style::default().fg(activity_color)),
            Span::raw("]"),
        ];

        let header = Paragraph::new(Line::from(header_text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Blue)),
            )
            .alignment(Alignment::Center);

        frame.render_widget(header, area);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(i, tab)| Line::from(format!("{} {}", i + 1, tab.title())))
            .collect();

        let tabs = Tabs::new(titles)
            .select(self.state.active_tab().index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );

        frame.render_widget(tabs, area);
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        match self.state.active_tab().resource() {
            None => self.render_dashboard(frame, area),
            Some(kind) => self.render_table(frame, area, kind),
        }
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect) {
        let Some(stats) = self.state.dashboard() else {
            let text = if self.state.is_loading() {
                "Loading statistics..."
            } else {
                "No statistics loaded. Press [r] to refresh."
            };
            let placeholder = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" Dashboard Overview "));
            frame.render_widget(placeholder, area);
            return;
        };

        let outer = Block::default()
            .borders(Borders::ALL)
            .title(" Dashboard Overview ");
        let inner = outer.inner(area);
        frame.render_widget(outer, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Length(5), Constraint::Min(0)])
            .split(inner);

        let counts = [
            ("Customers", stats.customers.to_string()),
            ("Loans", stats.loans.to_string()),
            ("Loan Types", stats.loan_types.to_string()),
            ("Guarantors", stats.guarantors.to_string()),
            ("Payments", stats.payments.to_string()),
        ];
        let count_cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 5); 5])
            .split(rows[0]);
        for (cell, (label, value)) in count_cells.iter().zip(counts) {
            render_stat_card(frame, *cell, label, value, Color::Cyan);
        }

        let totals = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 2); 2])
            .split(rows[1]);
        render_stat_card(
            frame,
            totals[0],
            "Total Loan Amount",
            format_amount(stats.total_loan_amount),
            Color::Green,
        );
        render_stat_card(
            frame,
            totals[1],
            "Total Payments",
            format_amount(stats.total_payments),
            Color::Magenta,
        );

        if let Some(at) = self.state.last_refresh() {
            let note = Paragraph::new(format!("Last refreshed at {}", at.format("%H:%M:%S")))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(note, rows[2]);
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, kind: ResourceKind) {
        let records = self.state.records(kind);
        let (headers, widths) = table_layout(kind);

        let header = Row::new(headers.iter().map(|h| Cell::from(*h)))
            .style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .bottom_margin(1);
        let rows: Vec<Row> = records.iter().map(record_row).collect();

        let mut title = format!(" {} Management ({}) ", title_of(kind), records.len());
        if let Some(filter) = self.state.filter() {
            title.push_str(&format!("[{}] ", filter));
        }
        if let Some(cursor) = self.state.customer_page().filter(|_| kind == ResourceKind::Customer) {
            title.push_str(&format!("[page {}/{}] ", cursor.page + 1, cursor.total_pages));
        }

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(Color::Blue)),
            )
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");

        let mut table_state = TableState::default();
        if !records.is_empty() {
            table_state.select(Some(self.state.selected()));
        }
        frame.render_stateful_widget(table, area, &mut table_state);

        if records.is_empty() {
            let empty = if self.state.is_loading() {
                format!("Loading {}...", kind.plural())
            } else {
                format!("No {} found", kind.plural())
            };
            let inner = Rect {
                x: area.x + 1,
                y: area.y + area.height / 2,
                width: area.width.saturating_sub(2),
                height: 1,
            }
            .intersection(area);
            frame.render_widget(
                Paragraph::new(empty)
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center),
                inner,
            );
        }
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let keybinds: Vec<(&str, &str)> = match (&self.mode, self.state.active_tab()) {
            (Mode::Form(_), _) => vec![
                ("Tab/↑↓", "Field"),
                ("←→", "Choose"),
                ("Enter", "Submit"),
                ("Esc", "Cancel"),
            ],
            (Mode::ConfirmDelete { .. }, _) => vec![("Y", "Delete"), ("N", "Keep")],
            (Mode::Browse, Tab::Dashboard) => vec![
                ("←→/1-6", "Tabs"),
                ("R", "Refresh"),
                ("X", "Dismiss"),
                ("?", "Help"),
                ("Q", "Quit"),
            ],
            (Mode::Browse, Tab::Customers) => vec![
                ("←→", "Tabs"),
                ("A", "Add"),
                ("E", "Edit"),
                ("D", "Delete"),
                ("F", "Credit"),
                ("S", "Email"),
                ("N/P", "Page"),
                ("R", "Refresh"),
                ("Q", "Quit"),
            ],
            (Mode::Browse, Tab::Loans) => vec![
                ("←→", "Tabs"),
                ("A", "Add"),
                ("E", "Edit"),
                ("D", "Delete"),
                ("F", "Status"),
                ("R", "Refresh"),
                ("X", "Dismiss"),
                ("Q", "Quit"),
            ],
            (Mode::Browse, _) => vec![
                ("←→", "Tabs"),
                ("↑↓", "Select"),
                ("A", "Add"),
                ("E", "Edit"),
                ("D", "Delete"),
                ("R", "Refresh"),
                ("X", "Dismiss"),
                ("Q", "Quit"),
            ],
        };

        let spans: Vec<Span> = keybinds
            .iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(
                        format!("[{}]", key),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(" {} ", desc)),
                ]
            })
            .collect();

        let footer = Paragraph::new(Line::from(spans))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .alignment(Alignment::Center);

        frame.render_widget(footer, area);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect, form: &FormState) {
        let hint_lines = form.fields.iter().filter(|f| f.hint.is_some()).count() as u16;
        let height = (form.fields.len() as u16) * 2 + hint_lines + 4;
        let popup = centered_rect(64, height, area);

        let mut lines = Vec::new();
        for (i, field) in form.fields.iter().enumerate() {
            let focused = i == form.focus;
            let marker = if field.required { " *" } else { "" };
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(Span::styled(format!("{}{}", field.label, marker), label_style)));

            let mut value = field.value.clone();
            if focused {
                value.push('▏');
            }
            if !field.choices.is_empty() && focused {
                value.push_str("  (←/→ to choose)");
            }
            lines.push(Line::from(Span::raw(format!("  {}", value))));

            if let Some(hint) = &field.hint {
                lines.push(Line::from(Span::styled(
                    format!("  {}", hint),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        let body = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", form.title()))
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(Clear, popup);
        frame.render_widget(body, popup);
    }

    fn render_confirm(&self, frame: &mut Frame, area: Rect, kind: ResourceKind, id: i64) {
        let popup = centered_rect(56, 5, area);
        let text = vec![
            Line::from(format!(
                "Are you sure you want to delete this {} (#{})?",
                kind.singular(),
                id
            )),
            Line::from(Span::styled(
                "[y] delete   [n] keep",
                Style::default().fg(Color::Yellow),
            )),
        ];
        let confirm = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Confirm ")
                    .border_style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(Clear, popup);
        frame.render_widget(confirm, popup);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, status: &Status) {
        let color = status_color(status.kind);
        let width = 56.min(area.width);
        let popup = Rect {
            x: area.x + area.width.saturating_sub(width + 1),
            y: area.y + 1,
            width,
            height: 6.min(area.height.saturating_sub(1)),
        }
        .intersection(area);
        if popup.area() == 0 {
            return;
        }

        let mut details = Vec::new();
        if let Some(code) = status.code_label() {
            details.push(Span::styled(code, Style::default().fg(color)));
            details.push(Span::raw("  "));
        }
        details.push(Span::styled(
            status.timestamp(),
            Style::default().fg(Color::DarkGray),
        ));

        let lines = vec![
            Line::from(vec![
                Span::styled(
                    format!("{} ", status.kind.icon()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(status.message.clone()),
            ]),
            Line::from(details),
            Line::from(Span::styled(
                "[x] dismiss",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let overlay = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", status.kind.as_str()))
                    .border_style(Style::default().fg(color)),
            );
        frame.render_widget(Clear, popup);
        frame.render_widget(overlay, popup);
    }

    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let entries = [
            ("←/→, 1-6", "Switch tab (loads it)"),
            ("↑/↓", "Move selection"),
            ("r", "Refresh current tab"),
            ("a / e / d", "Add, edit, delete"),
            ("f", "Filter loans by status / customers by credit score"),
            ("s", "Search customer by email"),
            ("n / p", "Next / previous customer page"),
            ("x, Esc", "Dismiss status"),
            ("?", "Toggle this help"),
            ("q", "Quit"),
        ];
        let lines: Vec<Line> = entries
            .iter()
            .map(|(key, desc)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>10}  ", key),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::raw(*desc),
                ])
            })
            .collect();

        let popup = centered_rect(70, entries.len() as u16 + 2, area);
        let help = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(Clear, popup);
        frame.render_widget(help, popup);
    }

    /// Returns false when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Form(mut form) => {
                match form.handle_key(key) {
                    FormOutcome::Editing => self.mode = Mode::Form(form),
                    FormOutcome::Cancel => {}
                    FormOutcome::Submit => {
                        if !self.submit(&form) {
                            self.mode = Mode::Form(form);
                        }
                    }
                }
                true
            }
            Mode::ConfirmDelete { kind, id } => {
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    debug!("deleting {} #{}", kind.singular(), id);
                    self.collector.delete(kind, id);
                }
                true
            }
            Mode::Browse => self.handle_browse_key(key),
        }
    }

    /// Sends a submitted form. Returns false if it stays open.
    fn submit(&self, form: &FormState) -> bool {
        let result = match form.purpose {
            FormPurpose::Create(_) => form.to_record().map(|record| {
                self.collector.save(record, None);
            }),
            FormPurpose::Edit(_, id) => form.to_record().map(|record| {
                self.collector.save(record, Some(id));
            }),
            FormPurpose::LoanStatusFilter => form.loan_status().map(|status| {
                self.collector.filter_loans(status);
            }),
            FormPurpose::CreditScoreFilter => form.credit_score().map(|score| {
                self.collector.filter_credit_score(score);
            }),
            FormPurpose::EmailSearch => {
                self.collector.search_email(form.value("Email").to_string());
                Ok(())
            }
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                self.collector.reject(&err);
                false
            }
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        if tab == self.state.active_tab() {
            return;
        }
        self.state.set_active_tab(tab);
        self.collector.refresh(tab);
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        let tab = self.state.active_tab();
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return false,
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.notifier.dismiss();
                }
            }
            KeyCode::Char('x') | KeyCode::Char('X') => self.notifier.dismiss(),
            KeyCode::Right | KeyCode::Tab => self.switch_tab(tab.next()),
            KeyCode::Left | KeyCode::BackTab => self.switch_tab(tab.previous()),
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                if let Some(target) = Tab::from_index(index) {
                    self.switch_tab(target);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.state.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.state.move_selection(1),
            KeyCode::PageUp => self.state.move_selection(-10),
            KeyCode::PageDown => self.state.move_selection(10),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.collector.refresh(tab);
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                if let Some(kind) = tab.resource() {
                    let mut form = FormState::create(kind);
                    self.add_hints(&mut form);
                    self.mode = Mode::Form(form);
                }
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                if let Some(mut form) = self.state.selected_record().as_ref().and_then(FormState::edit) {
                    self.add_hints(&mut form);
                    self.mode = Mode::Form(form);
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                if let Some(record) = self.state.selected_record() {
                    if let Some(id) = record.id() {
                        if self.state.config.confirm_deletes {
                            self.mode = Mode::ConfirmDelete {
                                kind: record.kind(),
                                id,
                            };
                        } else {
                            self.collector.delete(record.kind(), id);
                        }
                    }
                }
            }
            KeyCode::Char('f') | KeyCode::Char('F') => match tab {
                Tab::Loans => self.mode = Mode::Form(FormState::prompt(FormPurpose::LoanStatusFilter)),
                Tab::Customers => {
                    self.mode = Mode::Form(FormState::prompt(FormPurpose::CreditScoreFilter))
                }
                _ => {}
            },
            KeyCode::Char('s') | KeyCode::Char('S') if tab == Tab::Customers => {
                self.mode = Mode::Form(FormState::prompt(FormPurpose::EmailSearch));
            }
            KeyCode::Char('n') | KeyCode::Char('N') if tab == Tab::Customers => {
                let next = match self.state.customer_page() {
                    Some(cursor) if cursor.page + 1 < cursor.total_pages => cursor.page + 1,
                    Some(cursor) => cursor.page,
                    None => 0,
                };
                self.collector.customer_page(next);
            }
            KeyCode::Char('p') | KeyCode::Char('P') if tab == Tab::Customers => {
                let previous = self
                    .state
                    .customer_page()
                    .map_or(0, |cursor| cursor.page.saturating_sub(1));
                self.collector.customer_page(previous);
            }
            _ => {}
        }
        true
    }

    /// Lists valid ids for the form's reference fields.
    fn add_hints(&self, form: &mut FormState) {
        let customers: Vec<String> = self
            .state
            .lookup(ResourceKind::Customer)
            .iter()
            .filter_map(|r| match r {
                Record::Customer(c) => Some(format!("{} {}", c.customer_id?, c.customer_name)),
                _ => None,
            })
            .collect();
        let loan_types: Vec<String> = self
            .state
            .lookup(ResourceKind::LoanType)
            .iter()
            .filter_map(|r| match r {
                Record::LoanType(t) => Some(format!(
                    "{} {} ({}%)",
                    t.loan_type_id?,
                    t.type_name,
                    format_optional(t.interest_rate)
                )),
                _ => None,
            })
            .collect();
        let loans: Vec<String> = self
            .state
            .lookup(ResourceKind::Loan)
            .iter()
            .filter_map(|r| match r {
                Record::Loan(l) => Some(format!(
                    "{} {}",
                    l.loan_id?,
                    l.loan_amount.map(format_amount).unwrap_or_default()
                )),
                _ => None,
            })
            .collect();

        for (label, options) in [
            ("Customer ID", customers),
            ("Loan Type ID", loan_types),
            ("Loan ID", loans),
        ] {
            if !options.is_empty() {
                form.set_hint(label, truncate(&options.join(", "), 120));
            }
        }
    }
}

fn title_of(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Customer => "Customer",
        ResourceKind::Loan => "Loan",
        ResourceKind::LoanType => "Loan Type",
        ResourceKind::Guarantor => "Guarantor",
        ResourceKind::Payment => "Payment",
    }
}

fn status_color(kind: StatusKind) -> Color {
    match kind {
        StatusKind::Error => Color::Red,
        StatusKind::Success => Color::Green,
        StatusKind::Info => Color::Blue,
    }
}

fn loan_status_color(status: Option<LoanStatus>) -> Color {
    match status {
        Some(LoanStatus::Approved) => Color::Green,
        Some(LoanStatus::Rejected) => Color::Red,
        Some(LoanStatus::Pending) => Color::Yellow,
        None => Color::Gray,
    }
}

fn render_stat_card(frame: &mut Frame, area: Rect, label: &str, value: String, color: Color) {
    let card = Paragraph::new(vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(label.to_string(), Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(card, area);
}

fn table_layout(kind: ResourceKind) -> (Vec<&'static str>, Vec<Constraint>) {
    match kind {
        ResourceKind::Customer => (
            vec!["ID", "Name", "Email", "Phone", "Address", "Credit Score"],
            vec![
                Constraint::Length(6),
                Constraint::Percentage(20),
                Constraint::Percentage(25),
                Constraint::Length(14),
                Constraint::Min(10),
                Constraint::Length(12),
            ],
        ),
        ResourceKind::Loan => (
            vec!["ID", "Customer", "Loan Type", "Amount", "Rate", "Tenure", "Status"],
            vec![
                Constraint::Length(6),
                Constraint::Percentage(20),
                Constraint::Percentage(18),
                Constraint::Length(16),
                Constraint::Length(8),
                Constraint::Length(12),
                Constraint::Length(10),
            ],
        ),
        ResourceKind::LoanType => (
            vec!["ID", "Type Name", "Description", "Interest Rate"],
            vec![
                Constraint::Length(6),
                Constraint::Percentage(25),
                Constraint::Min(20),
                Constraint::Length(14),
            ],
        ),
        ResourceKind::Guarantor => (
            vec!["ID", "Name", "Email", "Phone", "Address", "Credit Score"],
            vec![
                Constraint::Length(6),
                Constraint::Percentage(20),
                Constraint::Percentage(25),
                Constraint::Length(14),
                Constraint::Min(10),
                Constraint::Length(12),
            ],
        ),
        ResourceKind::Payment => (
            vec!["ID", "Loan", "Customer", "Amount", "Payment Date"],
            vec![
                Constraint::Length(6),
                Constraint::Length(8),
                Constraint::Percentage(30),
                Constraint::Length(16),
                Constraint::Length(14),
            ],
        ),
    }
}

fn record_row(record: &Record) -> Row<'static> {
    let id = format_optional(record.id());
    match record {
        Record::Customer(c) => Row::new(vec![
            Cell::from(id),
            Cell::from(c.customer_name.clone()),
            Cell::from(c.email.clone()),
            Cell::from(format_optional(c.phone_number.as_deref())),
            Cell::from(truncate(c.address.as_deref().unwrap_or("N/A"), 40)),
            Cell::from(format_optional(c.credit_score)),
        ]),
        Record::Loan(l) => {
            let status = l.status.clone().unwrap_or_else(|| "N/A".to_string());
            Row::new(vec![
                Cell::from(id),
                Cell::from(format_optional(
                    l.customer.as_ref().map(|c| c.customer_name.as_str()),
                )),
                Cell::from(format_optional(
                    l.loan_type.as_ref().map(|t| t.type_name.as_str()),
                )),
                Cell::from(l.loan_amount.map_or("N/A".to_string(), format_amount)),
                Cell::from(l.interest_rate.map_or("N/A".to_string(), |r| format!("{}%", r))),
                Cell::from(
                    l.tenure_months
                        .map_or("N/A".to_string(), |m| format!("{} months", m)),
                ),
                Cell::from(status).style(Style::default().fg(loan_status_color(l.loan_status()))),
            ])
        }
        Record::LoanType(t) => Row::new(vec![
            Cell::from(id),
            Cell::from(t.type_name.clone()),
            Cell::from(truncate(t.description.as_deref().unwrap_or("N/A"), 60)),
            Cell::from(t.interest_rate.map_or("N/A".to_string(), |r| format!("{}%", r))),
        ]),
        Record::Guarantor(g) => Row::new(vec![
            Cell::from(id),
            Cell::from(g.guarantor_name.clone()),
            Cell::from(format_optional(g.email.as_deref())),
            Cell::from(format_optional(g.phone_number.as_deref())),
            Cell::from(truncate(g.address.as_deref().unwrap_or("N/A"), 40)),
            Cell::from(format_optional(g.credit_score)),
        ]),
        Record::Payment(p) => Row::new(vec![
            Cell::from(id),
            Cell::from(format_optional(
                p.loan.as_ref().and_then(|l| l.loan_id).map(|id| format!("#{}", id)),
            )),
            Cell::from(format_optional(
                p.loan
                    .as_ref()
                    .and_then(|l| l.customer.as_ref())
                    .map(|c| c.customer_name.clone()),
            )),
            Cell::from(p.amount.map_or("N/A".to_string(), format_amount)),
            Cell::from(format_optional(p.payment_date)),
        ]),
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::AppConfig;
    use crate::data::backend::{ApiResponse, MockBackend};
    use crate::data::models::{customer_ref, Loan, LoanType};
    use crate::data::operations::ScreenOps;
    use crate::status::{StatusStore, Visibility};
    use crossbeam_channel::unbounded;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn console(mock: MockBackend) -> (Console, Arc<AppState>, StatusStore) {
        let store = StatusStore::new();
        let state = Arc::new(AppState::new(AppConfig::default()));
        let (tx, _rx) = unbounded();
        let ops = ScreenOps::new(Arc::new(mock), store.clone());
        let collector = DataCollector::new(ops, Arc::clone(&state), tx);
        let notifier = StatusNotifier::spawn(store.clone(), AppConfig::default().status_display);
        (Console::new(Arc::clone(&state), collector, notifier), state, store)
    }

    fn loans() -> Vec<Record> {
        vec![Record::Loan(Loan {
            loan_id: Some(1),
            loan_amount: Some(250_000.0),
            interest_rate: Some(8.5),
            tenure_months: Some(240),
            status: Some("APPROVED".to_string()),
            customer: Some(customer_ref(1)),
            loan_type: Some(LoanType {
                loan_type_id: Some(1),
                type_name: "Home Loan".to_string(),
                ..LoanType::default()
            }),
        })]
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    fn screen_text(console: &Console) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| console.render(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content
            .iter()
            .map(|cell| cell.symbol().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_renders_table_and_status_overlay() {
        let (console, state, store) = console(MockBackend::new());
        state.set_active_tab(Tab::Loans);
        state.set_records(ResourceKind::Loan, loans());
        store.report_success("Successfully loaded 1 loans", Some(200.into()));
        settle().await;

        let text = screen_text(&console);
        assert!(text.contains("Home Loan Management System"));
        assert!(text.contains("Loan Management (1)"));
        assert!(text.contains("$250,000"));
        assert!(text.contains("APPROVED"));
        assert!(text.contains("Successfully loaded 1 loans"));
        assert!(text.contains("HTTP 200"));
    }

    #[tokio::test]
    async fn test_status_overlay_fits_tiny_terminal() {
        let (console, state, store) = console(MockBackend::new());
        store.report_error("Failed to fetch loans", Some(crate::status::StatusCode::NetworkError));
        settle().await;
        assert!(console.notifier().visible().is_some());

        for height in [1, 2, 5, 6] {
            let mut terminal = Terminal::new(TestBackend::new(80, height)).unwrap();
            terminal.draw(|f| console.render(f)).unwrap();
        }
        let mut terminal = Terminal::new(TestBackend::new(20, 5)).unwrap();
        terminal.draw(|f| console.render(f)).unwrap();

        state.set_active_tab(Tab::Loans);
        let mut terminal = Terminal::new(TestBackend::new(80, 5)).unwrap();
        terminal.draw(|f| console.render(f)).unwrap();
    }

    #[tokio::test]
    async fn test_dismiss_key_hides_status() {
        let (mut console, _state, store) = console(MockBackend::new());
        store.report_error("Failed to save loan", Some(crate::status::StatusCode::Http(400)));
        settle().await;
        assert_eq!(console.notifier().visibility(), Visibility::Visible);

        assert!(console.handle_key(key(KeyCode::Char('x'))));
        assert_eq!(console.notifier().visibility(), Visibility::Hidden);
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_invalid_form_stays_open_and_reports() {
        let (mut console, state, store) = console(MockBackend::new());
        state.set_active_tab(Tab::Loans);

        console.handle_key(key(KeyCode::Char('a')));
        assert!(matches!(console.mode(), Mode::Form(_)));
        console.handle_key(key(KeyCode::Enter));

        assert!(matches!(console.mode(), Mode::Form(_)));
        let status = store.current().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.message, "Loan Amount is required");
    }

    #[tokio::test]
    async fn test_delete_asks_for_confirmation() {
        let mut mock = MockBackend::new();
        mock.expect_delete()
            .times(1)
            .returning(|_, _| Ok(ApiResponse::new(200, ())));
        mock.expect_list()
            .returning(|_| Ok(ApiResponse::new(200, Vec::new())));
        let (mut console, state, store) = console(mock);
        state.set_active_tab(Tab::Loans);
        state.set_records(ResourceKind::Loan, loans());

        console.handle_key(key(KeyCode::Char('d')));
        assert_eq!(
            console.mode(),
            &Mode::ConfirmDelete {
                kind: ResourceKind::Loan,
                id: 1
            }
        );
        console.handle_key(key(KeyCode::Char('y')));
        assert_eq!(console.mode(), &Mode::Browse);

        // Let the spawned delete finish
        for _ in 0..50 {
            if store.current().is_some() && !state.is_loading() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.current().unwrap().message, "Loan deleted successfully");
    }

    #[tokio::test]
    async fn test_declined_delete_sends_nothing() {
        let mut mock = MockBackend::new();
        mock.expect_delete().times(0);
        let (mut console, state, _store) = console(mock);
        state.set_active_tab(Tab::Loans);
        state.set_records(ResourceKind::Loan, loans());

        console.handle_key(key(KeyCode::Char('d')));
        console.handle_key(key(KeyCode::Char('n')));
        assert_eq!(console.mode(), &Mode::Browse);
    }

    #[tokio::test]
    async fn test_quit_key() {
        let (mut console, _state, _store) = console(MockBackend::new());
        assert!(!console.handle_key(key(KeyCode::Char('q'))));
    }
}
