use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lookup_cli::api::{ApiError, LookupResponse, LookupService, Meta, ReloadResponse, Row};
use lookup_cli::dispatch::{run_command, Dispatcher};
use lookup_cli::render::html;
use lookup_cli::search::{ApiEvent, Command, NavKey, ResultsView, SearchController, SearchSettings};
use serde_json::json;

/// In-memory backend matching names by case-insensitive substring
struct MemoryService {
    rows: Vec<Row>,
    requests: Mutex<Vec<String>>,
    /// Suggest queries that answer slowly
    slow_queries: Vec<String>,
}

impl MemoryService {
    fn new() -> Self {
        let rows = vec![
            json!({"name": "Jane Doe", "alias": "JD", "city": "Pune", "_name_key": "jane doe"}),
            json!({"name": "Janet King", "alias": "", "city": "Nashik", "_name_key": "janet king"}),
            json!({"name": "A & B", "alias": "<script>alert(1)</script>", "city": ""}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();

        Self {
            rows,
            requests: Mutex::new(Vec::new()),
            slow_queries: Vec::new(),
        }
    }

    fn with_slow_query(mut self, query: &str) -> Self {
        self.slow_queries.push(query.to_string());
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn names(&self) -> impl Iterator<Item = String> + '_ {
        self.rows
            .iter()
            .filter_map(|row| row.get("name").and_then(|v| v.as_str()).map(String::from))
    }
}

#[async_trait]
impl LookupService for MemoryService {
    async fn meta(&self) -> Result<Meta, ApiError> {
        self.requests.lock().unwrap().push("meta".to_string());
        Ok(Meta {
            name_col: "name".to_string(),
            columns: vec!["name".to_string(), "alias".to_string(), "city".to_string()],
            total_rows: self.rows.len() as u64,
        })
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<String>, ApiError> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("suggest:{query}:{limit}"));
        if self.slow_queries.iter().any(|q| q == query) {
            tokio::time::sleep(Duration::from_millis(60)).await;
        }
        let needle = query.to_lowercase();
        Ok(self
            .names()
            .filter(|name| name.to_lowercase().contains(&needle))
            .take(limit)
            .collect())
    }

    async fn lookup(&self, name: &str) -> Result<LookupResponse, ApiError> {
        self.requests.lock().unwrap().push(format!("lookup:{name}"));
        if name.trim().is_empty() {
            return Err(ApiError::status(400, "Missing name"));
        }
        let needle = name.trim().to_lowercase();
        let rows: Vec<Row> = self
            .rows
            .iter()
            .filter(|row| {
                row.get("name")
                    .and_then(|v| v.as_str())
                    .map_or(false, |n| n.to_lowercase() == needle)
            })
            .cloned()
            .collect();
        Ok(LookupResponse {
            count: Some(rows.len()),
            rows,
        })
    }

    async fn reload(&self) -> Result<ReloadResponse, ApiError> {
        Ok(ReloadResponse {
            ok: true,
            name_col: "name".to_string(),
            total_rows: self.rows.len() as u64,
        })
    }
}

async fn run(service: &MemoryService, controller: &mut SearchController, command: Command) {
    let event = run_command(service, command).await;
    if let Some(follow_up) = controller.apply(event) {
        let event = run_command(service, follow_up).await;
        controller.apply(event);
    }
}

#[tokio::test]
async fn test_type_select_and_render() {
    let service = MemoryService::new();
    let mut controller = SearchController::new(SearchSettings::default());
    let startup = controller.startup();
    run(&service, &mut controller, startup).await;
    assert_eq!(controller.columns().options(), &["name", "alias", "city"]);

    let start = Instant::now();
    controller.on_input("j", start);
    controller.on_input("ja", start + Duration::from_millis(50));
    controller.on_input("jan", start + Duration::from_millis(100));
    assert_eq!(controller.poll(start + Duration::from_millis(200)), None);
    let suggest = controller
        .poll(start + Duration::from_millis(350))
        .expect("debounce window elapsed");
    run(&service, &mut controller, suggest).await;

    assert_eq!(controller.suggestions().options(), &["Jane Doe", "Janet King"]);
    assert_eq!(controller.suggestions().active(), None);

    controller.on_key(NavKey::Down);
    let outcome = controller.on_key(NavKey::Enter);
    assert!(outcome.consumed);
    assert_eq!(controller.query(), "Jane Doe");
    assert!(!controller.suggestions().is_open());
    assert_eq!(controller.results(), &ResultsView::Loading { skeletons: 2 });

    run(&service, &mut controller, outcome.command.unwrap()).await;
    let cards = controller.cards().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].title, "Jane Doe");
    let keys: Vec<&str> = cards[0].fields.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, vec!["alias", "city"]);

    // Only one suggest request went out for the three keystrokes
    assert_eq!(
        service.requests(),
        vec!["meta", "suggest:jan:100", "lookup:Jane Doe"]
    );
}

#[tokio::test]
async fn test_free_text_lookup_and_no_matches() {
    let service = MemoryService::new();
    let mut controller = SearchController::new(SearchSettings::default());
    controller.on_input("xy", Instant::now());
    let outcome = controller.on_key(NavKey::Enter);
    let command = outcome.command.unwrap();
    assert_eq!(
        command,
        Command::Lookup {
            seq: 1,
            name: "xy".to_string()
        }
    );

    run(&service, &mut controller, command).await;
    assert_eq!(controller.results(), &ResultsView::NoMatches);
    let rendered = html::render_results(
        controller.results(),
        controller.name_col(),
        controller.settings(),
    );
    assert!(rendered.contains("No matches"));
}

#[tokio::test]
async fn test_escaped_card_and_column_switch() {
    let service = MemoryService::new();
    let mut controller = SearchController::new(SearchSettings::default());
    let startup = controller.startup();
    run(&service, &mut controller, startup).await;

    let command = controller.choose("A & B");
    run(&service, &mut controller, command).await;

    let rendered = html::render_results(
        controller.results(),
        controller.name_col(),
        controller.settings(),
    );
    assert!(rendered.contains(r#"<h2 class="card-title">A &amp; B</h2>"#));
    assert!(rendered.contains("<tr><th>City</th><td>—</td></tr>"));
    assert!(rendered.contains("&lt;script&gt;"));
    assert!(!rendered.contains("<script>"));

    // Switching to alias re-titles the card and re-runs suggestions
    let resuggest = controller.set_name_column("alias").expect("query is long enough");
    assert!(matches!(resuggest, Command::Suggest { ref query, .. } if query == "A & B"));
    let rendered = html::render_results(
        controller.results(),
        controller.name_col(),
        controller.settings(),
    );
    assert!(rendered.contains("&lt;script&gt;alert(1)&lt;/script&gt;</h2>"));
}

#[tokio::test]
async fn test_slow_older_suggestion_does_not_win() {
    let service = Arc::new(MemoryService::new().with_slow_query("ja"));
    let (dispatcher, mut events) =
        Dispatcher::new(tokio::runtime::Handle::current(), service.clone());
    let mut controller = SearchController::new(SearchSettings::default());

    let start = Instant::now();
    controller.on_input("ja", start);
    dispatcher.dispatch(controller.poll(start + Duration::from_millis(250)).unwrap());
    controller.on_input("janet", start + Duration::from_millis(300));
    dispatcher.dispatch(controller.poll(start + Duration::from_millis(550)).unwrap());

    // "janet" answers first, the slow "ja" afterwards
    let first = events.recv().await.unwrap();
    assert!(matches!(first, ApiEvent::Suggestions { seq: 2, .. }));
    controller.apply(first);
    let second = events.recv().await.unwrap();
    assert!(matches!(second, ApiEvent::Suggestions { seq: 1, .. }));
    controller.apply(second);

    assert_eq!(controller.suggestions().options(), &["Janet King"]);
}

#[tokio::test]
async fn test_reload_refreshes_meta() {
    let service = MemoryService::new();
    let mut controller = SearchController::new(SearchSettings::default());
    let reload = controller.reload();
    run(&service, &mut controller, reload).await;

    assert_eq!(controller.notice(), Some("Reloaded 3 rows"));
    assert_eq!(controller.meta().total_rows, 3);
    assert_eq!(service.requests(), vec!["meta"]);
}
