use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Query};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use lookup_cli::api::{ApiClient, ApiError, LookupService};
use serde_json::json;

/// Serve `router` on an ephemeral port and return its base URL
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: &str, password: Option<&str>) -> ApiClient {
    ApiClient::new(base_url, password.map(String::from), None).unwrap()
}

fn dataset_router() -> Router {
    Router::new()
        .route(
            "/api/meta",
            get(|| async {
                Json(json!({"name_col": "name", "columns": ["name", "city"], "total_rows": 2}))
            }),
        )
        .route(
            "/api/lookup",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                match params.get("name").map(|n| n.trim()) {
                    Some(name) if !name.is_empty() => Json(json!({
                        "rows": [{"name": name, "city": "Pune"}],
                        "count": 1
                    }))
                    .into_response(),
                    _ => (StatusCode::BAD_REQUEST, "Missing name").into_response(),
                }
            }),
        )
        .route(
            "/api/reload",
            post(|| async { Json(json!({"ok": true, "name_col": "name", "total_rows": 7})) }),
        )
}

#[tokio::test]
async fn test_meta_is_parsed() {
    let base = spawn_server(dataset_router()).await;
    let meta = client(&base, None).meta().await.unwrap();
    assert_eq!(meta.name_col, "name");
    assert_eq!(meta.columns, vec!["name", "city"]);
    assert_eq!(meta.total_rows, 2);
}

#[tokio::test]
async fn test_suggest_sends_query_and_limit() {
    let seen: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
    let recorder = seen.clone();
    let router = Router::new().route(
        "/api/suggest",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(params);
                Json(json!({"options": ["Jane Doe", "Janet King"]}))
            }
        }),
    );
    let base = spawn_server(router).await;

    let options = client(&base, None).suggest("ja ne", 100).await.unwrap();
    assert_eq!(options, vec!["Jane Doe", "Janet King"]);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["q"], "ja ne");
    assert_eq!(seen[0]["limit"], "100");
}

#[tokio::test]
async fn test_lookup_and_error_body() {
    let base = spawn_server(dataset_router()).await;
    let api = client(&base, None);

    let response = api.lookup("Jane Doe").await.unwrap();
    assert_eq!(response.match_count(), 1);
    assert_eq!(response.rows[0]["city"], "Pune");

    let err = api.lookup("  ").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 400, .. }));
    assert_eq!(err.to_string(), "Missing name");
}

#[tokio::test]
async fn test_empty_error_body_and_bad_json() {
    let router = Router::new()
        .route("/api/meta", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/api/lookup", get(|| async { "not json" }));
    let base = spawn_server(router).await;
    let api = client(&base, None);

    let err = api.meta().await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.to_string(), "HTTP 500");

    let err = api.lookup("x").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { ref path, .. } if path == "/api/lookup"));
}

#[tokio::test]
async fn test_reload() {
    let base = spawn_server(dataset_router()).await;
    let reloaded = client(&base, None).reload().await.unwrap();
    assert!(reloaded.ok);
    assert_eq!(reloaded.total_rows, 7);
}

fn has_auth_cookie(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("auth=token"))
}

/// Mirrors the real server: a good password answers with a redirect to the
/// protected home page and sets the cookie on the redirect itself.
fn protected_router(logins: Arc<Mutex<usize>>) -> Router {
    Router::new()
        .route(
            "/login",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let logins = logins.clone();
                async move {
                    *logins.lock().unwrap() += 1;
                    if form.get("password").map(String::as_str) == Some("pw") {
                        (
                            StatusCode::FOUND,
                            [
                                (header::LOCATION, "/"),
                                (header::SET_COOKIE, "auth=token; Path=/; HttpOnly"),
                            ],
                        )
                            .into_response()
                    } else {
                        (StatusCode::UNAUTHORIZED, "Incorrect password").into_response()
                    }
                }
            }),
        )
        .route(
            "/",
            get(|headers: HeaderMap| async move {
                if has_auth_cookie(&headers) {
                    (StatusCode::OK, "<html>home</html>").into_response()
                } else {
                    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
                }
            }),
        )
        .route(
            "/api/meta",
            get(|headers: HeaderMap| async move {
                if has_auth_cookie(&headers) {
                    Json(json!({"name_col": "alias", "columns": ["alias"], "total_rows": 1}))
                        .into_response()
                } else {
                    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
                }
            }),
        )
}

#[tokio::test]
async fn test_login_cookie_survives_redirect() {
    let logins = Arc::new(Mutex::new(0));
    let base = spawn_server(protected_router(logins.clone())).await;
    let api = client(&base, Some("pw"));

    let meta = api.meta().await.unwrap();
    assert_eq!(meta.name_col, "alias");
    api.meta().await.unwrap();
    assert_eq!(*logins.lock().unwrap(), 1);

    // Without a password the protected route rejects us
    let err = client(&base, None).meta().await.unwrap_err();
    assert_eq!(err.status_code(), Some(401));
}

#[tokio::test]
async fn test_wrong_password_is_reported() {
    let base = spawn_server(protected_router(Arc::default())).await;
    let err = client(&base, Some("wrong")).meta().await.unwrap_err();
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(err.to_string(), "Login rejected: incorrect password");
}
