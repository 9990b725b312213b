use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use nm_client::HttpFeedClient;
use nm_core::{ArticleId, Coordinates, ErrorKind, FeedSource, FetchScope};
use serde_json::{json, Value};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn list_news(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    seen.lock().unwrap().push(params.clone());
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(200);
    let items: Vec<Value> = (1..=30)
        .map(|id| {
            let category = if id % 3 == 0 { "спорт" } else { "общество" };
            json!({
                "id": id,
                "title": format!("Новость {}", id),
                "url": format!("https://news29.ru/{}", id),
                "preview": "",
                "date": "2025-11-06",
                "source": "news29.ru",
                "image": null,
                "category": category,
            })
        })
        .filter(|item| match params.get("category") {
            Some(category) => item["category"] == category.as_str(),
            None => true,
        })
        .take(limit)
        .collect();
    Json(Value::Array(items))
}

async fn full_news(Path(id): Path<String>) -> impl IntoResponse {
    match id.as_str() {
        "7" => Json(json!({"content": "<p>Полный текст</p>", "coords": [64.5401, 40.5433]})).into_response(),
        "8" => Json(json!({"content": "<p>Без адреса</p>", "coords": null, "image": "https://img/8.jpg"})).into_response(),
        "9" => (StatusCode::OK, "<html>not json</html>").into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"}))).into_response(),
    }
}

async fn spawn_service() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/news", get(list_news))
        .route("/news/:id/full", get(full_news))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

#[tokio::test]
async fn test_fetch_unscoped_news() {
    let (base, seen) = spawn_service().await;
    let client = HttpFeedClient::new(&base).unwrap();

    let articles = client.fetch_news(500, &FetchScope::All).await.unwrap();
    assert_eq!(articles.len(), 30);
    assert_eq!(articles[0].id, ArticleId::Int(1));
    assert_eq!(articles[29].title, "Новость 30");

    let params = seen.lock().unwrap()[0].clone();
    assert_eq!(params.get("limit").map(String::as_str), Some("500"));
    assert!(!params.contains_key("category"));
}

#[tokio::test]
async fn test_fetch_scoped_news() {
    let (base, seen) = spawn_service().await;
    let client = HttpFeedClient::new(&base).unwrap();

    let articles = client
        .fetch_news(200, &FetchScope::Category("спорт".into()))
        .await
        .unwrap();
    assert_eq!(articles.len(), 10);
    assert!(articles.iter().all(|a| a.category == "спорт"));

    let params = seen.lock().unwrap()[0].clone();
    assert_eq!(params.get("category").map(String::as_str), Some("спорт"));
}

#[tokio::test]
async fn test_limit_is_forwarded() {
    let (base, _seen) = spawn_service().await;
    let client = HttpFeedClient::new(&base).unwrap();
    let articles = client.fetch_news(5, &FetchScope::All).await.unwrap();
    assert_eq!(articles.len(), 5);
}

#[tokio::test]
async fn test_fetch_detail() {
    let (base, _seen) = spawn_service().await;
    let client = HttpFeedClient::new(&base).unwrap();

    let detail = client.fetch_detail(&ArticleId::Int(7)).await.unwrap();
    assert_eq!(detail.id, ArticleId::Int(7));
    assert_eq!(detail.content, "<p>Полный текст</p>");
    assert_eq!(detail.coords, Coordinates::new(64.5401, 40.5433));

    let detail = client.fetch_detail(&ArticleId::Int(8)).await.unwrap();
    assert!(detail.coords.is_none());
    assert_eq!(detail.image.as_deref(), Some("https://img/8.jpg"));
}

#[tokio::test]
async fn test_missing_detail_is_network_error() {
    let (base, _seen) = spawn_service().await;
    let client = HttpFeedClient::new(&base).unwrap();
    let err = client.fetch_detail(&ArticleId::Int(404)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let (base, _seen) = spawn_service().await;
    let client = HttpFeedClient::new(&base).unwrap();
    let err = client.fetch_detail(&ArticleId::Int(9)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpFeedClient::new(&format!("http://{}", addr)).unwrap();
    let err = client.fetch_news(10, &FetchScope::All).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}
