//! HTML fragments for the search page: suggestion panel, name-column
//! selector and result cards. Every interpolated string is escaped.

use std::fmt::Write;

use crate::api::Meta;
use crate::search::results::{ERROR_TITLE, NO_MATCHES_HINT, NO_MATCHES_TITLE};
use crate::search::{build_cards, Card, ColumnSelector, ResultsView, SearchSettings, SuggestionList};

/// Escape `& < > " '` as named character entities
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_suggestions(list: &SuggestionList) -> String {
    if !list.is_open() {
        return r#"<div id="suggestions" class="suggestions" hidden></div>"#.to_string();
    }

    let mut html = String::from(r#"<div id="suggestions" class="suggestions" role="listbox">"#);
    for (index, option) in list.options().iter().enumerate() {
        let active = list.active() == Some(index);
        let _ = write!(
            html,
            r#"<div class="item{}" role="option" data-index="{}" aria-selected="{}">{}</div>"#,
            if active { " active" } else { "" },
            index,
            active,
            escape_html(option)
        );
    }
    html.push_str("</div>");
    html
}

/// The `<select>` for the name column, plus the chip naming the current one
pub fn render_column_selector(selector: &ColumnSelector, meta: &Meta) -> String {
    let mut html = String::from(r#"<select id="name-col">"#);
    for (index, column) in selector.options().iter().enumerate() {
        let selected = if selector.selected_index() == Some(index) {
            " selected"
        } else {
            ""
        };
        let escaped = escape_html(column);
        let _ = write!(html, r#"<option value="{escaped}"{selected}>{escaped}</option>"#);
    }
    html.push_str("</select>");
    let _ = write!(
        html,
        r#"<span class="chip">Name column: {}</span><span class="chip muted">{} rows</span>"#,
        escape_html(&meta.name_col),
        meta.total_rows
    );
    html
}

fn render_empty_state(title: &str, message: &str, class: &str) -> String {
    format!(
        r#"<div class="empty {}"><h3>{}</h3><p>{}</p></div>"#,
        class,
        escape_html(title),
        escape_html(message)
    )
}

pub fn render_card(card: &Card) -> String {
    let mut html = format!(
        r#"<div class="card"><h2 class="card-title">{}</h2><table class="kv">"#,
        escape_html(&card.title)
    );
    for field in &card.fields {
        let _ = write!(
            html,
            r#"<tr><th>{}</th><td>{}</td></tr>"#,
            escape_html(&field.label),
            escape_html(&field.value)
        );
    }
    html.push_str("</table></div>");
    html
}

pub fn render_cards(cards: &[Card]) -> String {
    cards.iter().map(render_card).collect()
}

/// The results area for any state of the search
pub fn render_results(view: &ResultsView, name_col: &str, settings: &SearchSettings) -> String {
    match view {
        ResultsView::Idle => String::new(),
        ResultsView::Loading { skeletons } => {
            r#"<div class="card skeleton" aria-busy="true"></div>"#.repeat(*skeletons)
        }
        ResultsView::NoMatches => render_empty_state(NO_MATCHES_TITLE, NO_MATCHES_HINT, "none"),
        ResultsView::Failed { message } => render_empty_state(ERROR_TITLE, message, "error"),
        ResultsView::Rows(rows) => render_cards(&build_cards(rows, name_col, settings)),
    }
}
