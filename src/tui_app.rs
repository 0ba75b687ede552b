use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::api::LookupService;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::logging::{LogHandle, LogRingBuffer};
use crate::search::results::{ERROR_TITLE, NO_MATCHES_HINT, NO_MATCHES_TITLE};
use crate::search::{
    ApiEvent, Card, Command, NavKey, ResultsView, SearchController, SearchSettings,
};

/// Longest the loop sleeps before checking for finished requests
const TICK: Duration = Duration::from_millis(50);

/// Log lines shown in the debug pane
const LOG_PANE_LINES: usize = 200;

const STATUS_KEYS: &str =
    " | F1=Help | F2=Column | Ctrl+L=Clear | Ctrl+R=Reload | F12=Logs | Esc=Exit";

/// Keys the suggestion panel reacts to
fn nav_key(code: KeyCode) -> Option<NavKey> {
    match code {
        KeyCode::Down => Some(NavKey::Down),
        KeyCode::Up => Some(NavKey::Up),
        KeyCode::Enter => Some(NavKey::Enter),
        KeyCode::Esc => Some(NavKey::Escape),
        KeyCode::Tab => Some(NavKey::Tab),
        _ => None,
    }
}

/// Map a click inside the suggestion panel to an option index
fn suggestion_index_at(area: Rect, offset: usize, column: u16, row: u16) -> Option<usize> {
    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    let inside = column >= inner.x
        && column < inner.x + inner.width
        && row >= inner.y
        && row < inner.y + inner.height;
    inside.then(|| offset + (row - inner.y) as usize)
}

pub struct TuiApp {
    controller: SearchController,
    dispatcher: Dispatcher,
    events: UnboundedReceiver<ApiEvent>,
    input: Input,
    logs: LogRingBuffer,
    log_path: Option<PathBuf>,
    use_glyphs: bool,
    show_help: bool,
    show_logs: bool,
    /// Open while the name-column picker is shown
    column_picker: Option<ListState>,
    suggestion_state: ListState,
    /// Where the suggestion panel was last drawn, for mouse hits
    suggestion_area: Option<Rect>,
    results_scroll: u16,
    should_quit: bool,
}

impl TuiApp {
    pub fn new(
        handle: Handle,
        service: Arc<dyn LookupService>,
        settings: SearchSettings,
        use_glyphs: bool,
        logs: LogHandle,
    ) -> Self {
        let (dispatcher, events) = Dispatcher::new(handle, service);
        Self {
            controller: SearchController::new(settings),
            dispatcher,
            events,
            input: Input::default(),
            logs: logs.buffer,
            log_path: logs.log_path,
            use_glyphs,
            show_help: false,
            show_logs: false,
            column_picker: None,
            suggestion_state: ListState::default(),
            suggestion_area: None,
            results_scroll: 0,
            should_quit: false,
        }
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let startup = self.controller.startup();
        self.dispatcher.dispatch(startup);

        while !self.should_quit {
            self.drain_events();
            if let Some(command) = self.controller.poll(Instant::now()) {
                self.dispatcher.dispatch(command);
            }

            terminal.draw(|f| self.ui(f))?;

            let timeout = self
                .controller
                .next_deadline(Instant::now())
                .map_or(TICK, |remaining| remaining.min(TICK));
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }

        info!(target: "tui", "Leaving interactive session");
        Ok(())
    }

    fn dispatch(&mut self, command: Option<Command>) {
        if let Some(command) = command {
            if matches!(command, Command::Lookup { .. }) {
                self.results_scroll = 0;
            }
            self.dispatcher.dispatch(command);
        }
    }

    /// Apply every finished request without blocking
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            let follow_up = self.controller.apply(event);
            self.dispatch(follow_up);
        }
    }

    /// Mirror controller-driven query changes (selection, clear) into the input
    fn sync_input(&mut self) {
        if self.input.value() != self.controller.query() {
            self.input = Input::new(self.controller.query().to_string());
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('l') => {
                    self.controller.clear();
                    self.sync_input();
                    return;
                }
                KeyCode::Char('r') => {
                    let reload = self.controller.reload();
                    self.dispatch(Some(reload));
                    return;
                }
                _ => {}
            }
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter) {
                self.show_help = false;
            }
            return;
        }

        if self.column_picker.is_some() {
            self.handle_picker_key(key.code);
            return;
        }

        match key.code {
            KeyCode::F(1) => {
                self.show_help = true;
                return;
            }
            KeyCode::F(2) => {
                self.open_column_picker();
                return;
            }
            KeyCode::F(12) => {
                self.show_logs = !self.show_logs;
                return;
            }
            KeyCode::PageDown => {
                self.results_scroll = self.results_scroll.saturating_add(10);
                return;
            }
            KeyCode::PageUp => {
                self.results_scroll = self.results_scroll.saturating_sub(10);
                return;
            }
            _ => {}
        }

        if let Some(nav) = nav_key(key.code) {
            let outcome = self.controller.on_key(nav);
            self.dispatch(outcome.command);
            if outcome.consumed {
                self.sync_input();
                return;
            }
            if nav == NavKey::Escape {
                self.should_quit = true;
                return;
            }
        }

        if let Some(change) = self.input.handle_event(&Event::Key(key)) {
            if change.value {
                self.controller.on_input(self.input.value(), Instant::now());
            }
        }
    }

    fn open_column_picker(&mut self) {
        let columns = self.controller.columns();
        if columns.is_empty() {
            debug!(target: "tui", "No columns known, picker unavailable");
            return;
        }
        let mut state = ListState::default();
        state.select(columns.selected_index().or(Some(0)));
        self.column_picker = Some(state);
    }

    fn handle_picker_key(&mut self, code: KeyCode) {
        let count = self.controller.columns().options().len();
        let Some(state) = self.column_picker.as_mut() else {
            return;
        };
        let current = state.selected().unwrap_or(0);

        match code {
            KeyCode::Down => state.select(Some((current + 1).min(count.saturating_sub(1)))),
            KeyCode::Up => state.select(Some(current.saturating_sub(1))),
            KeyCode::Esc | KeyCode::F(2) => self.column_picker = None,
            KeyCode::Enter => {
                self.column_picker = None;
                if let Some(column) = self.controller.columns().options().get(current).cloned() {
                    let command = self.controller.set_name_column(&column);
                    self.dispatch(command);
                }
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(area) = self.suggestion_area else {
                    return;
                };
                let offset = self.suggestion_state.offset();
                if let Some(index) = suggestion_index_at(area, offset, mouse.column, mouse.row) {
                    let command = self.controller.select_index(index);
                    self.dispatch(command);
                    self.sync_input();
                }
            }
            MouseEventKind::ScrollDown => {
                self.results_scroll = self.results_scroll.saturating_add(3);
            }
            MouseEventKind::ScrollUp => {
                self.results_scroll = self.results_scroll.saturating_sub(3);
            }
            _ => {}
        }
    }

    fn ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search input
                Constraint::Min(5),    // Results area
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_input(f, chunks[0]);

        if self.show_logs {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);
            self.render_results(f, split[0]);
            self.render_logs(f, split[1]);
        } else {
            self.render_results(f, chunks[1]);
        }

        self.render_status(f, chunks[2]);

        // Overlays go last so they sit on top of the results
        self.render_suggestions(f, chunks[0], chunks[1]);
        if self.column_picker.is_some() {
            self.render_column_picker(f);
        }
        if self.show_help {
            self.render_help_popup(f);
        }
    }

    fn render_input(&self, f: &mut Frame, area: Rect) {
        let meta = self.controller.meta();
        let separator = if self.use_glyphs { " · " } else { " | " };
        let chip = Line::from(vec![
            Span::raw(" Name column: "),
            Span::styled(
                meta.name_col.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{}{} rows ", separator, meta.total_rows)),
        ])
        .right_aligned();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Search ")
            .title_top(chip);

        let input = Paragraph::new(self.input.value())
            .block(block)
            .style(Style::default().fg(Color::Yellow));
        f.render_widget(input, area);

        if self.column_picker.is_none() && !self.show_help {
            f.set_cursor_position((area.x + self.input.visual_cursor() as u16 + 1, area.y + 1));
        }
    }

    fn render_suggestions(&mut self, f: &mut Frame, input_area: Rect, results_area: Rect) {
        let suggestions = self.controller.suggestions();
        if !suggestions.is_open() {
            self.suggestion_area = None;
            self.suggestion_state = ListState::default();
            return;
        }

        let count = suggestions.options().len();
        let wanted = Rect {
            x: input_area.x,
            y: input_area.y + input_area.height,
            width: input_area.width,
            height: (count as u16).saturating_add(2),
        };
        // Borders plus one option must fit inside the results area
        let area = wanted.intersection(results_area);
        if area.height < 3 {
            self.suggestion_area = None;
            return;
        }

        let items: Vec<ListItem> = suggestions
            .options()
            .iter()
            .map(|option| ListItem::new(option.as_str()))
            .collect();
        let title = format!(" Suggestions ({count}) ");
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(if self.use_glyphs { "▸ " } else { "> " });

        self.suggestion_state.select(suggestions.active());
        f.render_widget(Clear, area);
        f.render_stateful_widget(list, area, &mut self.suggestion_state);
        self.suggestion_area = Some(area);
    }

    fn card_lines(&self, card: &Card) -> Vec<Line<'static>> {
        let label_width = card
            .fields
            .iter()
            .map(|field| field.label.chars().count())
            .max()
            .unwrap_or(0);

        let mut lines = vec![Line::from(Span::styled(
            card.title.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))];
        for field in &card.fields {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:<width$}  ", field.label, width = label_width),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(field.value.clone()),
            ]));
        }
        lines.push(Line::from(""));
        lines
    }

    fn render_results(&self, f: &mut Frame, area: Rect) {
        let view = self.controller.results();
        let (title, lines): (String, Vec<Line>) = match view {
            ResultsView::Idle => (
                " Results ".to_string(),
                vec![
                    Line::from("Type at least two letters of a name to see suggestions."),
                    Line::from(""),
                    Line::from("  ↑↓      - Move through suggestions"),
                    Line::from("  Enter   - Look up the highlighted name, or the typed text"),
                    Line::from("  F2      - Choose the name column"),
                    Line::from("  F1      - Help"),
                ],
            ),
            ResultsView::Loading { skeletons } => {
                let bar = if self.use_glyphs { "░" } else { "." };
                let mut lines = Vec::new();
                for _ in 0..*skeletons {
                    lines.push(Line::from(Span::styled(
                        bar.repeat(24),
                        Style::default().fg(Color::DarkGray),
                    )));
                    for width in [36, 28, 32] {
                        lines.push(Line::from(Span::styled(
                            format!("  {}", bar.repeat(width)),
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                    lines.push(Line::from(""));
                }
                (" Loading... ".to_string(), lines)
            }
            ResultsView::NoMatches => (
                " Results ".to_string(),
                vec![
                    Line::from(Span::styled(
                        NO_MATCHES_TITLE,
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(NO_MATCHES_HINT),
                ],
            ),
            ResultsView::Failed { message } => (
                " Results ".to_string(),
                vec![
                    Line::from(Span::styled(
                        ERROR_TITLE,
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(message.clone()),
                ],
            ),
            ResultsView::Rows(_) => {
                let cards = self.controller.cards().unwrap_or_default();
                let count = self.controller.match_count().unwrap_or(cards.len());
                let lines = cards.iter().flat_map(|card| self.card_lines(card)).collect();
                (format!(" Results ({count} matches) "), lines)
            }
        };

        let alignment = match view {
            ResultsView::NoMatches | ResultsView::Failed { .. } => Alignment::Center,
            _ => Alignment::Left,
        };
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(alignment)
            .wrap(Wrap { trim: false })
            .scroll((self.results_scroll, 0));
        f.render_widget(paragraph, area);
    }

    fn render_logs(&self, f: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = if self.logs.is_empty() {
            vec![Line::from("No log entries yet")]
        } else {
            self.logs
                .get_recent(LOG_PANE_LINES.min(visible.max(1)))
                .into_iter()
                .map(|entry| Line::from(entry.format_for_display()))
                .collect()
        };
        let title = match &self.log_path {
            Some(path) => format!(" Logs: {} entries ({}) ", self.logs.len(), path.display()),
            None => format!(" Logs: {} entries ", self.logs.len()),
        };
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(Color::Gray));
        f.render_widget(paragraph, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let message = match (self.controller.notice(), self.controller.match_count()) {
            (Some(notice), _) => notice.to_string(),
            (None, Some(count)) => format!("{count} matches"),
            (None, None) => "Ready".to_string(),
        };
        let status_line = Line::from(vec![
            Span::styled(message, Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled(
                if self.controller.suggestions().is_open() {
                    "SUGGEST"
                } else {
                    "INPUT"
                },
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(STATUS_KEYS),
        ]);

        let status = Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray));
        f.render_widget(status, area);
    }

    fn render_column_picker(&mut self, f: &mut Frame) {
        let area = centered_rect(40, 50, f.area());
        let current = self.controller.name_col().to_string();
        let items: Vec<ListItem> = self
            .controller
            .columns()
            .options()
            .iter()
            .map(|column| {
                let marker = if *column == current { " (current)" } else { "" };
                ListItem::new(format!("{column}{marker}"))
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Name column (Enter to apply, Esc to cancel) "),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol(">> ");

        f.render_widget(Clear, area);
        if let Some(state) = self.column_picker.as_mut() {
            f.render_stateful_widget(list, area, state);
        }
    }

    fn render_help_popup(&self, f: &mut Frame) {
        let area = centered_rect(70, 60, f.area());
        f.render_widget(Clear, area);

        let help_text = vec![
            Line::from(vec![Span::styled(
                "Lookup Help",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from("Search:"),
            Line::from("  Type        - Suggestions appear after a short pause"),
            Line::from("  ↑↓          - Move through suggestions"),
            Line::from("  Enter       - Look up highlighted suggestion or typed text"),
            Line::from("  Esc / Tab   - Close suggestions"),
            Line::from("  Click       - Look up a suggestion"),
            Line::from(""),
            Line::from("Results:"),
            Line::from("  PgUp/PgDn   - Scroll cards"),
            Line::from(""),
            Line::from("Global:"),
            Line::from("  F2          - Choose which column is the name"),
            Line::from("  Ctrl+L      - Clear search"),
            Line::from("  Ctrl+R      - Reload dataset on the server"),
            Line::from("  F12         - Toggle log pane"),
            Line::from("  Esc         - Exit (when no suggestions are open)"),
        ];

        let help_popup = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: true });

        f.render_widget(help_popup, area);
    }
}

// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn run_tui_app(
    handle: Handle,
    service: Arc<dyn LookupService>,
    config: &Config,
    logs: LogHandle,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!(target: "tui", "Connecting to {}", config.server.base_url);
    let mut app = TuiApp::new(
        handle,
        service,
        SearchSettings::from(config),
        config.display.use_glyphs,
        logs,
    );
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}
