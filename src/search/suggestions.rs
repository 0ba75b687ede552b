/// The suggestion panel: an ordered option list plus a highlight cursor.
///
/// The cursor is either `None` or a valid index into `options`, and goes back
/// to `None` whenever the list is rebuilt or cleared. The panel is open exactly
/// when it holds at least one option.
#[derive(Debug, Clone, Default)]
pub struct SuggestionList {
    /// Current suggestions, already truncated
    options: Vec<String>,

    /// Highlighted suggestion
    active: Option<usize>,
}

impl SuggestionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Get the highlighted suggestion
    pub fn active_option(&self) -> Option<&str> {
        self.active
            .and_then(|index| self.options.get(index))
            .map(String::as_str)
    }

    /// Rebuild from a server response, keeping at most `max` entries.
    /// An empty response closes the panel.
    pub fn replace(&mut self, mut options: Vec<String>, max: usize) {
        options.truncate(max);
        self.options = options;
        self.active = None;
    }

    /// Close the panel
    pub fn hide(&mut self) {
        self.options.clear();
        self.active = None;
    }

    /// Move the highlight down, stopping at the last entry
    pub fn move_down(&mut self) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() - 1;
        self.active = Some(match self.active {
            None => 0,
            Some(index) => (index + 1).min(last),
        });
    }

    /// Move the highlight up, stopping at the first entry
    pub fn move_up(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.active = Some(self.active.map_or(0, |index| index.saturating_sub(1)));
    }
}
