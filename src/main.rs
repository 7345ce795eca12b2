//! News collection service — binary entrypoint.
//! Boots the Axum HTTP server, wiring sources, cache, and middleware.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_radar::api::{self, AppState};
use news_radar::cache::ResultCache;
use news_radar::collector::Collector;
use news_radar::config::{Settings, SourceReadiness};
use news_radar::matcher::TopicMatcher;
use news_radar::metrics::Metrics;
use news_radar::sources::feeds::FeedSource;
use news_radar::sources::forum::ForumSource;
use news_radar::sources::social::SocialSource;
use news_radar::sources::SourceAdapter;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("news_radar=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env();
    let metrics = Metrics::init(settings.cache_ttl_secs);

    let matcher = Arc::new(TopicMatcher::from_env_or_default()?);

    // Cache unavailability degrades silently; collection never depends on it.
    let cache = ResultCache::connect(&settings.redis_url, settings.cache_ttl_secs).await;

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(FeedSource::new(&settings, matcher.clone())?),
        Arc::new(SocialSource::new(&settings)?),
        Arc::new(ForumSource::new(&settings)?),
    ];
    let state = AppState::new(
        Arc::new(Collector::new(adapters)),
        cache,
        SourceReadiness::from_settings(&settings),
    );

    let frontend_origin =
        (!settings.frontend_url.is_empty()).then_some(settings.frontend_url.as_str());
    let app = api::create_router(state, frontend_origin).merge(metrics.router());

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
