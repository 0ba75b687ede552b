use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::{ApiError, LookupResponse, Meta, ReloadResponse};
use crate::debouncer::Debouncer;

use super::columns::ColumnSelector;
use super::results::{build_cards, Card, ResultsView};
use super::suggestions::SuggestionList;
use super::SearchSettings;

/// Backend work requested by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchMeta,
    Suggest { seq: u64, query: String, limit: usize },
    Lookup { seq: u64, name: String },
    Reload,
}

/// Completed backend work, fed back into the controller
#[derive(Debug)]
pub enum ApiEvent {
    Meta(Result<Meta, ApiError>),
    Suggestions {
        seq: u64,
        result: Result<Vec<String>, ApiError>,
    },
    Lookup {
        seq: u64,
        result: Result<LookupResponse, ApiError>,
    },
    Reloaded(Result<ReloadResponse, ApiError>),
}

/// Keys with special meaning while the suggestion panel is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Down,
    Up,
    Enter,
    Escape,
    Tab,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    /// The key was handled here and must not reach the text input
    pub consumed: bool,
    pub command: Option<Command>,
}

impl KeyOutcome {
    fn pass() -> Self {
        Self::default()
    }

    fn consumed(command: Option<Command>) -> Self {
        Self {
            consumed: true,
            command,
        }
    }
}

/// Owns all UI state of a search session.
///
/// Responses are matched to requests by sequence number: a suggestion
/// response is applied only when it is newer than everything applied or
/// invalidated before it, and only the latest lookup is ever rendered.
#[derive(Debug)]
pub struct SearchController {
    settings: SearchSettings,
    meta: Meta,
    columns: ColumnSelector,
    query: String,
    suggestions: SuggestionList,
    results: ResultsView,
    debouncer: Debouncer,
    /// Last suggest sequence number handed out
    suggest_seq: u64,
    /// Suggest responses at or below this are stale
    suggest_floor: u64,
    /// Sequence number of the lookup whose response we are waiting for
    lookup_seq: u64,
    match_count: Option<usize>,
    notice: Option<String>,
}

impl SearchController {
    pub fn new(settings: SearchSettings) -> Self {
        let debouncer = Debouncer::new(settings.debounce_ms);
        Self {
            settings,
            meta: Meta::default(),
            columns: ColumnSelector::empty(),
            query: String::new(),
            suggestions: SuggestionList::new(),
            results: ResultsView::Idle,
            debouncer,
            suggest_seq: 0,
            suggest_floor: 0,
            lookup_seq: 0,
            match_count: None,
            notice: None,
        }
    }

    /// The first command of every session
    pub fn startup(&self) -> Command {
        Command::FetchMeta
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn name_col(&self) -> &str {
        &self.meta.name_col
    }

    pub fn columns(&self) -> &ColumnSelector {
        &self.columns
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &SuggestionList {
        &self.suggestions
    }

    pub fn results(&self) -> &ResultsView {
        &self.results
    }

    /// Cards for the current rows, titled by the current name column
    pub fn cards(&self) -> Option<Vec<Card>> {
        match &self.results {
            ResultsView::Rows(rows) => Some(build_cards(rows, &self.meta.name_col, &self.settings)),
            _ => None,
        }
    }

    pub fn match_count(&self) -> Option<usize> {
        self.match_count
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn is_gated(&self, text: &str) -> bool {
        text.trim().chars().count() < self.settings.min_query_chars
    }

    /// Close the panel and make every outstanding suggest response stale
    fn hide_suggestions(&mut self) {
        self.debouncer.reset();
        self.suggestions.hide();
        self.suggest_floor = self.suggest_seq;
    }

    /// The query text changed because the user typed
    pub fn on_input(&mut self, text: &str, now: Instant) {
        self.query = text.to_string();
        if self.is_gated(text) {
            self.hide_suggestions();
        } else {
            self.debouncer.trigger_at(now);
        }
    }

    /// Fire the debounced suggest request if its quiet period is over
    pub fn poll(&mut self, now: Instant) -> Option<Command> {
        if self.debouncer.should_execute_at(now) {
            self.suggest_now()
        } else {
            None
        }
    }

    /// How long the event loop may sleep before `poll` has work to do
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_remaining_at(now)
    }

    /// Run the suggestion flow for the current text without waiting
    pub fn suggest_now(&mut self) -> Option<Command> {
        self.debouncer.reset();
        if self.is_gated(&self.query) {
            self.hide_suggestions();
            return None;
        }

        self.suggest_seq += 1;
        debug!(target: "search", "Suggest #{} for {:?}", self.suggest_seq, self.query);
        Some(Command::Suggest {
            seq: self.suggest_seq,
            query: self.query.trim().to_string(),
            limit: self.settings.suggest_limit,
        })
    }

    pub fn on_key(&mut self, key: NavKey) -> KeyOutcome {
        if !self.suggestions.is_open() {
            // Enter still submits the typed text
            if key == NavKey::Enter && !self.query.trim().is_empty() {
                let name = self.query.clone();
                return KeyOutcome::consumed(Some(self.choose(&name)));
            }
            return KeyOutcome::pass();
        }

        match key {
            NavKey::Down => {
                self.suggestions.move_down();
                KeyOutcome::consumed(None)
            }
            NavKey::Up => {
                self.suggestions.move_up();
                KeyOutcome::consumed(None)
            }
            NavKey::Enter => {
                let name = match self.suggestions.active_option() {
                    Some(option) => option.to_string(),
                    None if !self.query.trim().is_empty() => self.query.clone(),
                    None => return KeyOutcome::consumed(None),
                };
                KeyOutcome::consumed(Some(self.choose(&name)))
            }
            NavKey::Escape | NavKey::Tab => {
                self.hide_suggestions();
                KeyOutcome::consumed(None)
            }
        }
    }

    /// Pick a suggestion by position, as a mouse click does
    pub fn select_index(&mut self, index: usize) -> Option<Command> {
        let name = self.suggestions.options().get(index)?.clone();
        Some(self.choose(&name))
    }

    /// Look up `name`: hide the panel, mirror it into the input and show
    /// skeleton cards until the response arrives.
    pub fn choose(&mut self, name: &str) -> Command {
        self.hide_suggestions();
        self.query = name.to_string();
        self.results = ResultsView::Loading {
            skeletons: self.settings.skeleton_cards,
        };
        self.match_count = None;
        self.lookup_seq += 1;
        info!(target: "search", "Lookup #{} for {:?}", self.lookup_seq, name);
        Command::Lookup {
            seq: self.lookup_seq,
            name: name.to_string(),
        }
    }

    /// Switch the column used as card title and re-run suggestions
    pub fn set_name_column(&mut self, column: &str) -> Option<Command> {
        if !self.columns.select(column) {
            warn!(target: "search", "Ignoring unknown name column {:?}", column);
            return None;
        }
        info!(target: "search", "Name column set to {:?}", column);
        self.meta.name_col = column.to_string();
        self.suggest_now()
    }

    /// The clear action: empty input, no panel, no results
    pub fn clear(&mut self) {
        self.query.clear();
        self.hide_suggestions();
        self.results = ResultsView::Idle;
        self.match_count = None;
        // A lookup still in flight must not repaint the cleared area
        self.lookup_seq += 1;
    }

    pub fn reload(&mut self) -> Command {
        self.notice = Some("Reloading dataset...".to_string());
        Command::Reload
    }

    /// Apply a finished request. May ask for follow-up work.
    pub fn apply(&mut self, event: ApiEvent) -> Option<Command> {
        match event {
            ApiEvent::Meta(result) => {
                self.apply_meta(result);
                None
            }
            ApiEvent::Suggestions { seq, result } => {
                self.apply_suggestions(seq, result);
                None
            }
            ApiEvent::Lookup { seq, result } => {
                self.apply_lookup(seq, result);
                None
            }
            ApiEvent::Reloaded(Ok(reloaded)) => {
                info!(
                    target: "search",
                    "Dataset reloaded: {} rows, name column {:?}",
                    reloaded.total_rows,
                    reloaded.name_col
                );
                self.notice = Some(format!("Reloaded {} rows", reloaded.total_rows));
                Some(Command::FetchMeta)
            }
            ApiEvent::Reloaded(Err(e)) => {
                warn!(target: "search", "Reload failed: {}", e);
                self.notice = Some(format!("Reload failed: {e}"));
                None
            }
        }
    }

    fn apply_meta(&mut self, result: Result<Meta, ApiError>) {
        match result {
            Ok(meta) => {
                info!(
                    target: "search",
                    "Meta: name column {:?}, {} columns, {} rows",
                    meta.name_col,
                    meta.columns.len(),
                    meta.total_rows
                );
                self.columns = ColumnSelector::from_meta(&meta);
                self.meta = meta;
            }
            Err(e) => {
                // Defaults stay in place
                warn!(target: "search", "Meta unavailable: {}", e);
            }
        }
    }

    fn apply_suggestions(&mut self, seq: u64, result: Result<Vec<String>, ApiError>) {
        if seq <= self.suggest_floor {
            debug!(target: "search", "Dropping stale suggest #{}", seq);
            return;
        }

        match result {
            Ok(options) => {
                self.suggest_floor = seq;
                self.suggestions.replace(options, self.settings.max_suggestions);
                debug!(
                    target: "search",
                    "Suggest #{} -> {} options",
                    seq,
                    self.suggestions.options().len()
                );
            }
            Err(e) => {
                debug!(target: "search", "Suggest #{} failed: {}", seq, e);
            }
        }
    }

    fn apply_lookup(&mut self, seq: u64, result: Result<LookupResponse, ApiError>) {
        if seq != self.lookup_seq {
            debug!(target: "search", "Dropping superseded lookup #{}", seq);
            return;
        }

        match result {
            Ok(response) => {
                self.match_count = Some(response.match_count());
                self.results = if response.rows.is_empty() {
                    ResultsView::NoMatches
                } else {
                    ResultsView::Rows(response.rows)
                };
            }
            Err(e) => {
                warn!(target: "search", "Lookup #{} failed: {}", seq, e);
                self.results = ResultsView::Failed {
                    message: e.to_string(),
                };
            }
        }
    }
}
