use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use crate::api::Meta;
use crate::search::results::{ERROR_TITLE, NO_MATCHES_HINT, NO_MATCHES_TITLE};
use crate::search::{build_cards, Card, ResultsView, SearchSettings};

/// One table per card: the title as header, then label/value rows
pub fn render_card(card: &Card) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new(&card.title).add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);

    for field in &card.fields {
        table.add_row(vec![
            Cell::new(&field.label).add_attribute(Attribute::Bold),
            Cell::new(&field.value),
        ]);
    }

    table.to_string()
}

pub fn render_results(view: &ResultsView, name_col: &str, settings: &SearchSettings) -> String {
    match view {
        ResultsView::Idle => String::new(),
        ResultsView::Loading { .. } => "Loading...".to_string(),
        ResultsView::NoMatches => format!("{NO_MATCHES_TITLE}\n{NO_MATCHES_HINT}"),
        ResultsView::Failed { message } => format!("{ERROR_TITLE}: {message}"),
        ResultsView::Rows(rows) => {
            let cards = build_cards(rows, name_col, settings);
            let mut out = cards
                .iter()
                .map(render_card)
                .collect::<Vec<_>>()
                .join("\n\n");
            out.push_str(&format!("\n\n{} match(es)", cards.len()));
            out
        }
    }
}

pub fn render_suggestions(options: &[String]) -> String {
    options.join("\n")
}

pub fn render_meta(meta: &Meta) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name column").add_attribute(Attribute::Bold),
        Cell::new("Rows").add_attribute(Attribute::Bold),
        Cell::new("Columns").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        meta.name_col.clone(),
        meta.total_rows.to_string(),
        meta.columns.join(", "),
    ]);
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_table_contains_fields() {
        let settings = SearchSettings::default();
        let row = json!({"name": "Jane Doe", "home_city": ""})
            .as_object()
            .cloned()
            .unwrap();
        let out = render_results(&ResultsView::Rows(vec![row]), "name", &settings);
        assert!(out.contains("Jane Doe"));
        assert!(out.contains("Home City"));
        assert!(out.contains("—"));
        assert!(out.ends_with("1 match(es)"));
    }

    #[test]
    fn test_empty_states() {
        let settings = SearchSettings::default();
        assert!(
            render_results(&ResultsView::NoMatches, "name", &settings).starts_with("No matches")
        );
        let failed = ResultsView::Failed {
            message: "Not authenticated".to_string(),
        };
        assert_eq!(
            render_results(&failed, "name", &settings),
            "Error: Not authenticated"
        );
    }

    #[test]
    fn test_meta_table() {
        let meta = Meta {
            name_col: "name".to_string(),
            columns: vec!["name".to_string(), "city".to_string()],
            total_rows: 42,
        };
        let out = render_meta(&meta);
        assert!(out.contains("42"));
        assert!(out.contains("name, city"));
    }
}
