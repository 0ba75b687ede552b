//! Search interaction core
//!
//! Everything between a keystroke and a rendered card: debounced suggestion
//! requests, the suggestion panel and its highlight cursor, the name-column
//! selector and the lookup results. No I/O happens here; the controller emits
//! `Command`s and consumes `ApiEvent`s.

pub mod columns;
pub mod controller;
pub mod results;
pub mod suggestions;

pub use columns::{column_options, ColumnSelector};
pub use controller::{ApiEvent, Command, KeyOutcome, NavKey, SearchController};
pub use results::{build_card, build_cards, label_for_key, Card, Field, ResultsView};
pub use suggestions::SuggestionList;

use crate::config::Config;

/// Tunables of the interaction core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Shorter queries never reach the server
    pub min_query_chars: usize,
    pub debounce_ms: u64,
    /// Suggestions kept from each response
    pub max_suggestions: usize,
    /// `limit` sent to `/api/suggest`
    pub suggest_limit: usize,
    pub skeleton_cards: usize,
    pub placeholder: String,
    pub reserved_prefix: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_query_chars: 2,
            debounce_ms: 250,
            max_suggestions: 300,
            suggest_limit: 100,
            skeleton_cards: 2,
            placeholder: "—".to_string(),
            reserved_prefix: "_".to_string(),
        }
    }
}

impl From<&Config> for SearchSettings {
    fn from(config: &Config) -> Self {
        Self {
            min_query_chars: config.search.min_query_chars,
            debounce_ms: config.search.debounce_ms,
            max_suggestions: config.search.max_suggestions,
            suggest_limit: config.search.suggest_limit,
            skeleton_cards: config.search.skeleton_cards,
            placeholder: config.display.placeholder.clone(),
            reserved_prefix: config.display.reserved_prefix.clone(),
        }
    }
}
