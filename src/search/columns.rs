use crate::api::Meta;

/// Candidate name columns: the declared name column first, then every
/// declared column, without duplicates, in first-seen order.
pub fn column_options(meta: &Meta) -> Vec<String> {
    let mut options: Vec<String> = Vec::with_capacity(meta.columns.len() + 1);
    for column in std::iter::once(&meta.name_col).chain(meta.columns.iter()) {
        if !options.contains(column) {
            options.push(column.clone());
        }
    }
    options
}

/// Choice of which column is shown as the record "name".
#[derive(Debug, Clone, Default)]
pub struct ColumnSelector {
    options: Vec<String>,
    selected: Option<usize>,
}

impl ColumnSelector {
    /// An unpopulated selector, used until meta has been fetched
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_meta(meta: &Meta) -> Self {
        let options = column_options(meta);
        let selected = options.iter().position(|c| c == &meta.name_col);
        Self { options, selected }
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_column(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }

    /// Select by column name. Returns false for columns not on offer.
    pub fn select(&mut self, column: &str) -> bool {
        match self.options.iter().position(|c| c == column) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }
}
