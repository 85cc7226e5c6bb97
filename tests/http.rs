use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use event_chart::{
    ApiClient, AppError, EventForm, EventSink, EventSubmission, HtmlChartRenderer, Poller,
    StatsSource, Submitter, UPDATE_INTERVAL, reshape,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct ReceivedEvent {
    authorization: Option<String>,
    content_type: Option<String>,
    body: Value,
}

/// Stand-in for the event backend: stats are whatever the test put there,
/// plus one row per posted event.
#[derive(Clone, Default)]
struct Backend {
    stats: Arc<Mutex<Vec<Value>>>,
    events: Arc<Mutex<Vec<ReceivedEvent>>>,
    broken: Arc<AtomicBool>,
}

async fn get_stats(State(backend): State<Backend>) -> Response {
    if backend.broken.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }
    let stats = backend.stats.lock().await.clone();
    Json(stats).into_response()
}

async fn create_event(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let timestamp = body["timestamp"].as_str().unwrap_or_default();
    let day = timestamp.get(..10).unwrap_or(timestamp).to_string();

    let mut events = backend.events.lock().await;
    events.push(ReceivedEvent {
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body: body.clone(),
    });
    backend.stats.lock().await.push(json!({
        "type": body["type"],
        "location": body["location"],
        "day": day,
        "avg_time_between": events.len() as f64,
    }));

    Json(json!({ "status": "success" }))
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/events", post(create_event))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("backend stopped");
    });

    format!("http://{addr}")
}

fn unique_chart_path() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("event_chart_http_{}_{}", std::process::id(), nanos));
    path.push("index.html");
    path
}

fn form(event_type: &str, location: &str) -> EventForm {
    EventForm {
        event_type: event_type.to_string(),
        location: location.to_string(),
        date: "2024-03-05".to_string(),
        hours: "9".to_string(),
        minutes: "5".to_string(),
    }
}

#[tokio::test]
async fn http_fetch_stats_groups_rows() {
    let backend = Backend::default();
    *backend.stats.lock().await = vec![
        json!({"type": "A", "location": "X", "day": "2024-01-01", "avg_time_between": 5}),
        json!({"type": "A", "location": "X", "day": "Tue, 02 Jan 2024 00:00:00 GMT", "avg_time_between": 7}),
        json!({"type": "B", "location": "Y", "day": "2024-01-01", "avg_time_between": 3}),
    ];
    let base_url = spawn_backend(backend).await;
    let client = ApiClient::new(format!("{base_url}/"), None);

    let records = client.fetch_stats().await.unwrap();
    assert_eq!(records.len(), 3);

    let series = reshape(&records);
    let labels: Vec<_> = series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["A - X", "B - Y"]);
    let ys: Vec<_> = series[0].points.iter().map(|p| p.y).collect();
    assert_eq!(ys, vec![Some(5.0), Some(7.0)]);
    assert!(series[0].points.iter().all(|p| p.x.is_some()));
}

#[tokio::test]
async fn http_submit_posts_json_with_token() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(base_url, Some("secret".to_string()));

    let event = EventSubmission {
        event_type: "Pee".to_string(),
        location: "Inside".to_string(),
        timestamp: "2024-03-05T09:05".to_string(),
    };
    client.submit_event(&event).await.unwrap();

    let events = backend.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].authorization.as_deref(), Some("Bearer secret"));
    assert_eq!(events[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        events[0].body,
        json!({"type": "Pee", "location": "Inside", "timestamp": "2024-03-05T09:05"})
    );
}

#[tokio::test]
async fn http_non_json_stats_is_a_decode_error() {
    let backend = Backend::default();
    backend.broken.store(true, Ordering::SeqCst);
    let base_url = spawn_backend(backend).await;
    let client = ApiClient::new(base_url, None);

    let result = client.fetch_stats().await;
    assert!(matches!(result, Err(AppError::Decode(_))));
}

#[tokio::test]
async fn http_submit_then_reload_updates_chart_page() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let client = Arc::new(ApiClient::new(base_url, None));
    let path = unique_chart_path();

    let (mut poller, reload) =
        Poller::new(client.clone(), HtmlChartRenderer::new(&path), UPDATE_INTERVAL);
    let submitter = Submitter::new(client, reload);

    poller.reload().await;
    let page = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(page.contains("No data yet"));

    assert!(submitter.submit(&form("Pee", "Inside")).await);
    assert!(submitter.submit(&form("Poo", "Outside")).await);
    poller.run_pending().await;

    let page = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(page.contains("Pee - Inside"));
    assert!(page.contains("Poo - Outside"));
    let chart = poller.controller().chart().expect("chart rendered");
    assert_eq!(chart.series, 2);
    assert_eq!(chart.points, 2);

    let timestamps: Vec<_> = backend
        .events
        .lock()
        .await
        .iter()
        .map(|event| event.body["timestamp"].clone())
        .collect();
    assert_eq!(timestamps, vec![json!("2024-03-05T09:05"), json!("2024-03-05T09:05")]);

    backend.broken.store(true, Ordering::SeqCst);
    poller.reload().await;
    assert!(!poller.controller().is_rendered());
    assert!(!path.exists());
}

#[tokio::test]
async fn http_unreachable_backend_is_logged_not_raised() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Arc::new(ApiClient::new(format!("http://{addr}"), None));
    let (mut poller, reload) = Poller::new(
        client.clone(),
        HtmlChartRenderer::new(unique_chart_path()),
        UPDATE_INTERVAL,
    );
    let submitter = Submitter::new(client, reload);

    assert!(!submitter.submit(&form("Pee", "Inside")).await);
    poller.run_pending().await;
    assert!(!poller.controller().is_rendered());
}
