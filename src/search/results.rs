use crate::api::{cell_text, Row};

use super::SearchSettings;

pub const NO_MATCHES_TITLE: &str = "No matches";
pub const NO_MATCHES_HINT: &str =
    "Nothing matched that name. Try fewer letters or pick one of the suggestions.";
pub const ERROR_TITLE: &str = "Error";

/// What the results area currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultsView {
    /// Nothing looked up yet, or cleared
    #[default]
    Idle,
    /// A lookup is in flight; render this many skeleton cards
    Loading { skeletons: usize },
    /// Lookup succeeded with zero rows
    NoMatches,
    /// Lookup succeeded; cards are built from these at render time
    Rows(Vec<Row>),
    /// Lookup failed with this message
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub label: String,
    pub value: String,
}

/// A record ready for display: a title plus labelled fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub fields: Vec<Field>,
}

/// Turn a raw column key into a display label: `full_name` -> `Full Name`
pub fn label_for_key(key: &str) -> String {
    key.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn or_placeholder(value: String, settings: &SearchSettings) -> String {
    if value.trim().is_empty() {
        settings.placeholder.clone()
    } else {
        value
    }
}

pub fn is_reserved(key: &str, settings: &SearchSettings) -> bool {
    !settings.reserved_prefix.is_empty() && key.starts_with(&settings.reserved_prefix)
}

pub fn build_card(row: &Row, name_col: &str, settings: &SearchSettings) -> Card {
    let title = or_placeholder(cell_text(row.get(name_col)), settings);

    let fields = row
        .iter()
        .filter(|(key, _)| key.as_str() != name_col && !is_reserved(key, settings))
        .map(|(key, value)| Field {
            key: key.clone(),
            label: label_for_key(key),
            value: or_placeholder(cell_text(Some(value)), settings),
        })
        .collect();

    Card { title, fields }
}

pub fn build_cards(rows: &[Row], name_col: &str, settings: &SearchSettings) -> Vec<Card> {
    rows.iter()
        .map(|row| build_card(row, name_col, settings))
        .collect()
}
