//! Test peer that answers with the application-status envelope.
//!
//! Every JSON reply is `{"status": "success", "data": ...}` or
//! `{"status": "error", "message": ...}`, always with HTTP 200, so clients
//! have to look at the body to tell the two apart. A few extra routes return
//! deliberately unusual bodies.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::QueryRejection, Query, RawQuery, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub title: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteItem {
    pub id: Option<Uuid>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/echo", get(echo_query).post(echo_body).delete(echo_query))
        .route("/items", get(list_items).post(create_item).delete(delete_item))
        .route("/fail", get(fail))
        .route("/garbage", get(garbage))
        .route("/binary", get(binary))
        .route("/no-status", get(no_status))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub fn success(data: Value) -> Json<Value> {
    Json(json!({"status": "success", "data": data}))
}

pub fn error(message: &str) -> Json<Value> {
    Json(json!({"status": "error", "message": message}))
}

fn header_map(headers: &HeaderMap) -> Value {
    let map: serde_json::Map<String, Value> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), Value::String(v.to_string())))
        })
        .collect();
    Value::Object(map)
}

/// Reflects the raw query string and request headers.
async fn echo_query(RawQuery(query): RawQuery, headers: HeaderMap) -> Json<Value> {
    success(json!({
        "query": query.unwrap_or_default(),
        "headers": header_map(&headers),
    }))
}

/// Reflects the body, parsed when it is JSON.
async fn echo_body(headers: HeaderMap, body: String) -> Json<Value> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let parsed = if content_type.starts_with("application/json") {
        serde_json::from_str(&body).unwrap_or(Value::Null)
    } else {
        Value::Null
    };
    success(json!({
        "content_type": content_type,
        "length": body.len(),
        "body": body,
        "json": parsed,
    }))
}

async fn list_items(State(db): State<Db>) -> Json<Value> {
    let items: Vec<Item> = db.read().await.values().cloned().collect();
    success(json!(items))
}

async fn create_item(State(db): State<Db>, body: String) -> Json<Value> {
    let input: CreateItem = match serde_json::from_str(&body) {
        Ok(input) => input,
        Err(_) => return error("body must be a JSON object"),
    };
    let Some(title) = input.title.filter(|t| !t.is_empty()) else {
        return error("title is required");
    };
    let item = Item {
        id: Uuid::new_v4(),
        title,
    };
    db.write().await.insert(item.id, item.clone());
    success(json!(item))
}

async fn delete_item(
    State(db): State<Db>,
    query: Result<Query<DeleteItem>, QueryRejection>,
) -> Json<Value> {
    let Some(id) = query.ok().and_then(|Query(q)| q.id) else {
        return error("id is required");
    };
    match db.write().await.remove(&id) {
        Some(item) => success(json!(item)),
        None => error("item not found"),
    }
}

async fn fail() -> Json<Value> {
    error("bad input")
}

async fn garbage() -> &'static str {
    "<html>definitely not json</html>"
}

async fn binary() -> Vec<u8> {
    vec![0xff, 0xfe, b'{', 0x80]
}

async fn no_status() -> Json<Value> {
    Json(json!({"data": 1}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope() {
        let Json(body) = success(json!(42));
        assert_eq!(body, json!({"status": "success", "data": 42}));
    }

    #[test]
    fn error_envelope() {
        let Json(body) = error("bad input");
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "bad input");
    }

    #[test]
    fn item_serializes_to_json() {
        let item = Item {
            id: Uuid::nil(),
            title: "Test".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["title"], "Test");
    }

    #[test]
    fn create_item_title_is_optional_in_schema() {
        let input: CreateItem = serde_json::from_str("{}").unwrap();
        assert!(input.title.is_none());
    }
}
