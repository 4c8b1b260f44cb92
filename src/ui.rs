use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use voter_lookup::{
    execute as run_effect, ApiClient, BulkNotifier, BulkState, Completion, Effect, EditState,
    FetchState, FieldKind, PageSizeChoice, Session, VoterRecord,
};

/// How long the loop waits for a key before servicing timers and completions
const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Typing in the search box
    Search,
    /// Moving through the result table
    Browse,
    Edit(FieldKind),
}

pub struct App {
    pub session: Session,
    pub mode: Mode,
    pub table: TableState,
    pub suggestion_cursor: Option<usize>,
    pub show_detail: bool,
    /// Local feedback that outranks the session status until the next key
    pub flash: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            mode: Mode::Search,
            table: TableState::default(),
            suggestion_cursor: None,
            show_detail: false,
            flash: None,
            should_quit: false,
        }
    }

    pub fn selected_record(&self) -> Option<&VoterRecord> {
        let page = self.session.page_records();
        self.table.selected().and_then(|i| page.get(i).copied())
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_record().map(|r| r.id.clone())
    }

    fn reset_selection(&mut self) {
        let rows = self.session.page_records().len();
        self.table.select(if rows == 0 { None } else { Some(0) });
    }

    fn clamp_selection(&mut self) {
        let rows = self.session.page_records().len();
        match self.table.selected() {
            _ if rows == 0 => self.table.select(None),
            Some(i) if i >= rows => self.table.select(Some(rows - 1)),
            None => self.table.select(Some(0)),
            _ => {}
        }
    }

    pub fn next(&mut self) {
        let rows = self.session.page_records().len();
        if rows == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(i) if i + 1 < rows => i + 1,
            _ => 0,
        };
        self.table.select(Some(i));
    }

    pub fn previous(&mut self) {
        let rows = self.session.page_records().len();
        if rows == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(0) | None => rows - 1,
            Some(i) => i - 1,
        };
        self.table.select(Some(i));
    }

    /// Feed a network completion back into the session
    pub fn apply(&mut self, completion: Completion) {
        self.session.apply(completion);

        if let Mode::Edit(kind) = self.mode {
            if *self.session.edit_state(kind) == EditState::Idle {
                self.mode = Mode::Browse;
            }
        }
        self.clamp_selection();
    }

    /// Handle one key press; may request network work
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Effect> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        self.flash = None;
        match self.mode {
            Mode::Search => self.search_key(key),
            Mode::Browse => self.browse_key(key),
            Mode::Edit(kind) => self.edit_key(kind, key),
        }
    }

    fn search_key(&mut self, key: KeyEvent) -> Option<Effect> {
        let suggestions = self.session.visible_suggestions().len();

        match key.code {
            KeyCode::Esc if suggestions > 0 => {
                self.session.hide_suggestions();
                self.suggestion_cursor = None;
            }
            KeyCode::Esc | KeyCode::Tab => self.mode = Mode::Browse,
            KeyCode::Enter => {
                let now = Instant::now();
                match self.suggestion_cursor.take() {
                    Some(i) => {
                        self.session.choose_suggestion(i, now);
                    }
                    None => self.session.submit(now),
                }
                self.mode = Mode::Browse;
                self.show_detail = false;
                self.reset_selection();
            }
            KeyCode::Down if suggestions > 0 => {
                self.suggestion_cursor = Some(match self.suggestion_cursor {
                    Some(i) if i + 1 < suggestions => i + 1,
                    _ => 0,
                });
            }
            KeyCode::Up if suggestions > 0 => {
                self.suggestion_cursor = Some(match self.suggestion_cursor {
                    Some(0) | None => suggestions - 1,
                    Some(i) => i - 1,
                });
            }
            KeyCode::Backspace => {
                self.session.pop_char();
                self.suggestion_cursor = None;
                self.reset_selection();
            }
            KeyCode::Char(c) => {
                self.session.push_char(c);
                self.suggestion_cursor = None;
            }
            _ => {}
        }
        None
    }

    fn browse_key(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Esc if self.show_detail => self.show_detail = false,
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('/') | KeyCode::Tab => self.mode = Mode::Search,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.reset_selection(),
            KeyCode::End => {
                let rows = self.session.page_records().len();
                if rows > 0 {
                    self.table.select(Some(rows - 1));
                }
            }
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char('n') => {
                if self.session.next_page() {
                    self.reset_selection();
                }
            }
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('p') => {
                if self.session.previous_page() {
                    self.reset_selection();
                }
            }
            KeyCode::Char('s') => {
                self.session.cycle_page_size();
                self.reset_selection();
            }
            KeyCode::Enter => self.show_detail = !self.show_detail,
            KeyCode::Char('m') => self.begin_edit(FieldKind::Mobile),
            KeyCode::Char('a') => self.begin_edit(FieldKind::Address),
            KeyCode::Char('w') => {
                let id = self.selected_id()?;
                return self.session.notify_record(&id);
            }
            KeyCode::Char('r') => return self.session.load(),
            KeyCode::Char('c') => {
                self.session.clear_search();
                self.show_detail = false;
                self.reset_selection();
            }
            _ => {}
        }
        None
    }

    fn begin_edit(&mut self, kind: FieldKind) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.session.begin_edit(kind, &id) {
            Ok(()) => self.mode = Mode::Edit(kind),
            Err(err) => self.flash = Some(err.to_string()),
        }
    }

    fn edit_key(&mut self, kind: FieldKind, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Esc => {
                self.session.cancel_edit(kind);
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => match self.session.save_edit(kind) {
                Ok(effect) => return Some(effect),
                Err(err) => self.flash = Some(err.to_string()),
            },
            KeyCode::Backspace => {
                if let Some(draft) = self.session.edit_draft_mut(kind) {
                    draft.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(draft) = self.session.edit_draft_mut(kind) {
                    draft.push(c);
                }
            }
            _ => {}
        }
        None
    }
}

// ============================================================================
// EFFECT DISPATCH
// ============================================================================

/// Runs effects on the tokio runtime; completions come back over a channel
struct Dispatcher {
    client: Arc<ApiClient>,
    notifier: BulkNotifier,
    handle: tokio::runtime::Handle,
    tx: Sender<Completion>,
}

impl Dispatcher {
    fn dispatch(&self, effect: Effect) {
        let client = Arc::clone(&self.client);
        let notifier = self.notifier.clone();
        let tx = self.tx.clone();

        self.handle.spawn(async move {
            run_effect(&*client, &notifier, effect, |completion| {
                // The receiver only goes away when the UI has exited
                let _ = tx.send(completion);
            })
            .await;
        });
    }
}

pub fn run_ui(
    app: &mut App,
    client: Arc<ApiClient>,
    notifier: BulkNotifier,
    handle: tokio::runtime::Handle,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let dispatcher = Dispatcher {
        client,
        notifier,
        handle,
        tx,
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, &dispatcher, &rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    dispatcher: &Dispatcher,
    rx: &Receiver<Completion>,
) -> Result<()> {
    if let Some(effect) = app.session.load() {
        dispatcher.dispatch(effect);
    }

    loop {
        terminal.draw(|f| ui(f, app))?;

        while let Ok(completion) = rx.try_recv() {
            app.apply(completion);
        }

        if let Some(effect) = app.session.tick(Instant::now()) {
            dispatcher.dispatch(effect);
        }

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(effect) = app.handle_key(key) {
                        dispatcher.dispatch(effect);
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with stats
            Constraint::Length(3), // Search box
            Constraint::Min(0),    // Results
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_search_box(f, chunks[1], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[2]);

        render_results(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_results(f, chunks[2], app);
    }

    render_status_bar(f, chunks[3], app);

    if app.mode == Mode::Search {
        render_suggestions(f, chunks[1], chunks[2], app);
    }
    if let Mode::Edit(kind) = app.mode {
        render_edit_popup(f, kind, app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.session.stats();

    let fetch = match app.session.fetch_state() {
        FetchState::Idle => Span::raw(""),
        FetchState::Loading => Span::styled("⏳ लोड होत आहे", Style::default().fg(Color::Yellow)),
        FetchState::Loaded => Span::styled("● ऑनलाइन", Style::default().fg(Color::Green)),
        FetchState::Failed(_) => Span::styled("● त्रुटी", Style::default().fg(Color::Red)),
    };

    let header_text = vec![Line::from(vec![
        Span::styled(
            "🗳️ मतदार शोध",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(format!("एकूण: {}", stats.total), Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(format!("पुरुष: {}", stats.males), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(format!("स्त्री: {}", stats.females), Style::default().fg(Color::Magenta)),
        Span::raw("  |  "),
        fetch,
    ])];

    let header = Paragraph::new(header_text)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_search_box(f: &mut Frame, area: Rect, app: &App) {
    let active = app.mode == Mode::Search;
    let border = if active { Color::Yellow } else { Color::DarkGray };

    let history: Vec<&str> = app.session.history().collect();
    let title = if history.is_empty() {
        " शोधा (/) ".to_string()
    } else {
        format!(" शोधा (/) · अलीकडील: {} ", history.join(", "))
    };

    let mut spans = vec![Span::raw(" 🔍 "), Span::raw(app.session.input().to_string())];
    if active {
        spans.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
    } else if app.session.input().is_empty() {
        spans.push(Span::styled(
            "नाव, मतदान कार्ड क्र. किंवा मोबाईल नंबर",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let search = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(truncate(&title, area.width.saturating_sub(2) as usize)),
    );

    f.render_widget(search, area);
}

fn render_suggestions(f: &mut Frame, anchor: Rect, content: Rect, app: &App) {
    let suggestions = app.session.visible_suggestions();
    if suggestions.is_empty() {
        return;
    }

    let height = (suggestions.len() as u16 + 2).min(content.height);
    let area = Rect {
        x: anchor.x + 2,
        y: content.y,
        width: anchor.width.saturating_sub(4).min(70),
        height,
    };

    let items: Vec<ListItem> = suggestions
        .iter()
        .map(|s| {
            let mut spans = vec![Span::styled(
                s.search_text.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            if !s.name_local.is_empty() && s.name_local != s.search_text {
                spans.push(Span::raw(format!("  {}", s.name_local)));
            }
            if !s.voter_card_id.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", s.voter_card_id),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" सूचना "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    let mut state = ListState::default();
    state.select(app.suggestion_cursor);

    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_results(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" मतदार यादी ");

    if app.session.match_count() == 0 {
        let message = if *app.session.fetch_state() == FetchState::Loading {
            "माहिती लोड होत आहे..."
        } else if app.session.query().is_empty() {
            "शोधण्यासाठी नाव, मतदान कार्ड क्र. किंवा मोबाईल नंबर टाइप करा"
        } else {
            "कोणतेही परिणाम आढळले नाहीत"
        };
        let placeholder = Paragraph::new(format!("\n  {}", message))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(placeholder, area);
        return;
    }

    let header_cells = [
        "अनु क्र.",
        "घर क्र.",
        "नाव (मराठी)",
        "नाव (इंग्रजी)",
        "लिंग",
        "वय",
        "मतदान कार्ड क्र.",
        "मोबाईल नं.",
    ]
    .iter()
    .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .session
        .page_records()
        .into_iter()
        .map(|record| {
            let mobile_color = if record.mobile_number.is_empty() {
                Color::DarkGray
            } else {
                Color::Green
            };

            Row::new(vec![
                Cell::from(record.serial_number.clone()),
                Cell::from(truncate(&record.house_number, 10)),
                Cell::from(truncate(&record.name_local, 24)),
                Cell::from(truncate(&record.name_latin, 24)),
                Cell::from(record.gender_label().to_string()),
                Cell::from(record.age.clone()),
                Cell::from(record.voter_card_id.clone()),
                Cell::from(or_dash(&record.mobile_number)).style(Style::default().fg(mobile_color)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(24),
            Constraint::Length(24),
            Constraint::Length(8),
            Constraint::Length(4),
            Constraint::Length(14),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.table);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" मतदार माहिती ");

    let Some(record) = app.selected_record() else {
        f.render_widget(Paragraph::new("कोणताही मतदार निवडलेला नाही").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let field = |name: &'static str, value: &str| {
        Line::from(vec![
            Span::styled(format!("  {}: ", name), label),
            Span::raw(or_dash(value)),
        ])
    };

    let content = vec![
        Line::from(""),
        field("अनु क्र.", &record.serial_number),
        field("घर क्र.", &record.house_number),
        field("नाव (मराठी)", &record.name_local),
        field("नाव (इंग्रजी)", &record.name_latin),
        field("लिंग", record.gender_label()),
        field("वय", &record.age),
        field("मतदान कार्ड क्र.", &record.voter_card_id),
        field("मोबाईल नं.", &record.mobile_number),
        Line::from(""),
        Line::from(vec![
            Span::styled("  m", Style::default().fg(Color::Yellow)),
            Span::raw(" मोबाईल  "),
            Span::styled("a", Style::default().fg(Color::Yellow)),
            Span::raw(" पत्ता  "),
            Span::styled("w", Style::default().fg(Color::Yellow)),
            Span::raw(" WhatsApp"),
        ]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_edit_popup(f: &mut Frame, kind: FieldKind, app: &App) {
    let area = centered_rect(50, 7, f.size());

    let title = match kind {
        FieldKind::Mobile => " मोबाईल नंबर संपादित करा ",
        FieldKind::Address => " पत्ता संपादित करा ",
    };

    let mut lines = Vec::new();
    match app.session.edit_state(kind) {
        EditState::Editing { draft, error, .. } => {
            lines.push(Line::from(vec![
                Span::raw(" "),
                Span::raw(draft.clone()),
                Span::styled("▏", Style::default().fg(Color::Yellow)),
            ]));
            if let Some(error) = error {
                lines.push(Line::from(Span::styled(
                    format!(" ⚠ {}", error),
                    Style::default().fg(Color::Red),
                )));
            }
        }
        EditState::Saving { value, .. } => {
            lines.push(Line::from(format!(" {}", value)));
            lines.push(Line::from(Span::styled(
                " जतन करत आहे...",
                Style::default().fg(Color::Yellow),
            )));
        }
        EditState::Idle => {}
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" जतन करा | "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" रद्द करा"),
    ]));

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let total = session.match_count();
    let pager = session.pager();

    let size = match pager.choice() {
        PageSizeChoice::Fixed(n) => n.to_string(),
        PageSizeChoice::All => "सर्व".to_string(),
    };

    let mut status_spans = vec![Span::styled(
        match pager.window(total) {
            Some((first, last)) => format!(
                " पृष्ठ {}/{} · {}-{} / {} ",
                pager.page(),
                session.total_pages(),
                first,
                last,
                total
            ),
            None => format!(" {} परिणाम ", total),
        },
        Style::default().fg(Color::Cyan),
    )];
    status_spans.push(Span::raw(format!("| आकार: {} ", size)));

    let bulk = match session.bulk_state() {
        BulkState::Scheduled { .. } => Some(("📨 लवकरच पाठवणार".to_string(), Color::Yellow)),
        BulkState::Running(p) => Some((
            format!("📨 {}/{} ✓{} ✗{}", p.attempted, p.total, p.succeeded, p.failed),
            Color::Yellow,
        )),
        BulkState::Finished(p) => Some((
            format!("📨 ✓{} ✗{} वगळले {}", p.succeeded, p.failed, p.skipped),
            Color::Green,
        )),
        BulkState::Idle => None,
    };
    let bulk = if session.is_notifying_one() {
        Some(("📨 एक संदेश पाठवत आहे".to_string(), Color::Yellow))
    } else {
        bulk
    };
    if let Some((text, color)) = bulk {
        status_spans.push(Span::raw("| "));
        status_spans.push(Span::styled(text, Style::default().fg(color)));
        status_spans.push(Span::raw(" "));
    }

    if let Some(message) = app.flash.as_deref().or(session.status()) {
        status_spans.push(Span::raw("| "));
        status_spans.push(Span::styled(message.to_string(), Style::default().fg(Color::White)));
        status_spans.push(Span::raw(" "));
    }

    let hints: &[(&str, &str)] = match app.mode {
        Mode::Search => &[("Enter", "शोधा"), ("↑/↓", "सूचना"), ("Tab", "यादी")],
        Mode::Browse => &[
            ("/", "शोध"),
            ("n/p", "पृष्ठ"),
            ("s", "आकार"),
            ("Enter", "माहिती"),
            ("r", "रीलोड"),
            ("q", "बाहेर"),
        ],
        Mode::Edit(_) => &[("Enter", "जतन"), ("Esc", "रद्द")],
    };
    for (key, label) in hints {
        status_spans.push(Span::raw("| "));
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(format!(" {} ", label)));
    }

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let width = r.width * percent_x / 100;
    Rect {
        x: r.x + (r.width.saturating_sub(width)) / 2,
        y: r.y + (r.height.saturating_sub(height)) / 2,
        width,
        height: height.min(r.height),
    }
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// Shorten to `max_chars` characters; Devanagari is multi-byte
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voter_lookup::SessionOptions;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let mut session = Session::new(SessionOptions::default());
        session.load();
        session.apply(Completion::RecordsLoaded(Ok(vec![
            VoterRecord {
                id: "1".into(),
                name_latin: "Ravi Kumar".into(),
                voter_card_id: "ABC1234567".into(),
                ..Default::default()
            },
            VoterRecord {
                id: "2".into(),
                name_latin: "Ravi Patil".into(),
                ..Default::default()
            },
        ])));
        App::new(session)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_truncate_is_char_aware() {
        assert_eq!(truncate("रवि कुमार पाटील", 6), "रवि...");
        assert_eq!(truncate("Ravi", 10), "Ravi");
    }

    #[test]
    fn test_search_then_browse() {
        let mut app = app();
        type_text(&mut app, "ravi");
        assert_eq!(app.session.visible_suggestions().len(), 2);

        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.session.query(), "Ravi Patil");
        assert_eq!(app.selected_record().map(|r| r.id.as_str()), Some("2"));
    }

    #[test]
    fn test_edit_popup_returns_to_browse_on_cancel() {
        let mut app = app();
        type_text(&mut app, "kumar");
        app.handle_key(press(KeyCode::Enter));

        app.handle_key(press(KeyCode::Char('m')));
        assert_eq!(app.mode, Mode::Edit(FieldKind::Mobile));

        type_text(&mut app, "123");
        assert!(app.handle_key(press(KeyCode::Enter)).is_none());
        assert!(app.flash.is_some(), "invalid number is reported");

        app.handle_key(press(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(*app.session.edit_state(FieldKind::Mobile), EditState::Idle);
    }

    #[test]
    fn test_ctrl_c_quits_from_any_mode() {
        let mut app = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
