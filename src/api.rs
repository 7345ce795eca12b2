// src/api.rs
//! HTTP front door: request validation, cache-aside lookup, and the
//! collection call. Validation failures never reach the orchestrator.

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use metrics::counter;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::cache::{cache_key, ResultCache, Singleflight};
use crate::collector::Collector;
use crate::config::{split_list, SourceReadiness};
use crate::model::SourceKind;

pub const MAX_TOPICS: usize = 10;
pub const MAX_TOPIC_LENGTH: usize = 100;

#[derive(Clone)]
pub struct AppState {
    collector: Arc<Collector>,
    cache: ResultCache,
    readiness: SourceReadiness,
    flights: Arc<Singleflight>,
}

impl AppState {
    pub fn new(collector: Arc<Collector>, cache: ResultCache, readiness: SourceReadiness) -> Self {
        Self {
            collector,
            cache,
            readiness,
            flights: Arc::new(Singleflight::default()),
        }
    }
}

pub fn create_router(state: AppState, frontend_origin: Option<&str>) -> Router {
    // A configured frontend origin restricts CORS to it; otherwise stay open.
    let cors = match frontend_origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::very_permissive(),
    };
    Router::new()
        .route("/api/health", get(health_status))
        .route("/api/collect", get(collect_news))
        .layer(cors)
        .with_state(state)
}

/// Liveness plus per-service readiness. Degraded services still answer
/// `ok`: the process serves requests either way, just with less coverage.
async fn health_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "services": {
            "cache": state.cache.is_available(),
            "feeds": state.readiness.feeds_configured,
            "forum": state.readiness.forum_configured,
            "social_session": state.readiness.social_session,
        }
    }))
}

#[derive(Deserialize)]
struct CollectParams {
    topics: Option<String>,
    sources: Option<String>,
}

fn bad_request(detail: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
}

fn json_body(cache_status: &'static str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::HeaderName::from_static("x-cache"), cache_status),
        ],
        body,
    )
        .into_response()
}

async fn collect_news(
    State(state): State<AppState>,
    Query(params): Query<CollectParams>,
) -> Response {
    counter!("collect_requests_total").increment(1);

    // --- Validate and parse topics ---
    let raw_topics = split_list(params.topics.as_deref().unwrap_or_default());
    if raw_topics.is_empty() {
        return bad_request("At least one topic is required".into());
    }
    if raw_topics.len() > MAX_TOPICS {
        return bad_request(format!(
            "Maximum {MAX_TOPICS} topics allowed, got {}",
            raw_topics.len()
        ));
    }
    // Deduplicate, keeping first-seen order for the response.
    let mut topic_list: Vec<String> = Vec::new();
    for t in raw_topics {
        if !topic_list.contains(&t) {
            topic_list.push(t);
        }
    }
    for topic in &topic_list {
        if topic.chars().count() > MAX_TOPIC_LENGTH {
            let head: String = topic.chars().take(20).collect();
            return bad_request(format!(
                "Topic '{head}...' exceeds {MAX_TOPIC_LENGTH} character limit"
            ));
        }
    }

    // --- Validate and parse sources ---
    let source_list = split_list(params.sources.as_deref().unwrap_or("feed,social,forum"));
    if source_list.is_empty() {
        return bad_request("At least one source must be enabled".into());
    }
    let mut kinds: Vec<SourceKind> = Vec::new();
    for s in &source_list {
        match s.parse::<SourceKind>() {
            Ok(kind) => {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
            Err(_) => {
                return bad_request(format!("Invalid sources: {s}. Valid: feed, social, forum"));
            }
        }
    }

    // --- Cache-aside with request coalescing ---
    let key = cache_key(&topic_list, &source_list);
    if let Some(cached) = state.cache.get(&key).await {
        counter!("collect_cache_hits_total").increment(1);
        info!(?topic_list, ?source_list, "cache hit");
        return json_body("HIT", cached);
    }

    // Concurrent identical requests queue behind the first; followers
    // usually find the leader's result in the cache when they wake up.
    let _flight = state.flights.acquire(&key).await;
    if let Some(cached) = state.cache.get(&key).await {
        counter!("collect_cache_hits_total").increment(1);
        return json_body("HIT", cached);
    }
    counter!("collect_cache_misses_total").increment(1);

    let results = match state.collector.collect(&topic_list, &kinds).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "collection failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "detail": "Failed to collect news from sources. Please try again."
                })),
            )
                .into_response();
        }
    };

    // Response object keeps topics in request order (serde_json preserves
    // insertion order).
    let mut ordered = serde_json::Map::new();
    for topic in &topic_list {
        let items = results.get(topic).cloned().unwrap_or_default();
        ordered.insert(topic.clone(), json!(items));
    }

    match serde_json::to_string(&ordered) {
        Ok(body) => {
            state.cache.set(&key, &body).await;
            json_body("MISS", body)
        }
        Err(e) => {
            error!(error = %e, "response serialization failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Internal error" })),
            )
                .into_response()
        }
    }
}
