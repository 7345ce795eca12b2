// src/config.rs
//! Process configuration, read once from the environment at startup.
//! `.env` loading happens in `main` via dotenvy before this runs.

use std::env;

/// Runtime settings with defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct Settings {
    // Server
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    // Feed source (comma-separated URLs)
    pub feed_urls: Vec<String>,

    // Forum source (absent credentials soft-disable the adapter)
    pub forum_client_id: String,
    pub forum_client_secret: String,
    pub forum_user_agent: String,

    // Social source (browser-rendering service + optional session material)
    pub browser_url: String,
    pub browser_token: Option<String>,
    /// Session cookies for authenticated social searches: inline JSON array
    /// or a path to a JSON file. Absent means searches run unauthenticated.
    pub social_cookies: Option<String>,

    // Cache backend
    pub redis_url: String,

    // Collection
    pub max_items_per_source: usize,
    pub cache_ttl_secs: u64,
    pub max_feed_age_days: i64,
}

const DEFAULT_FEEDS: &str = "https://feeds.bbci.co.uk/news/rss.xml,\
                             https://feeds.reuters.com/reuters/topNews";

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Split a comma-separated list, trimming and dropping empties.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Per-service readiness snapshot, reported by the health endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceReadiness {
    pub feeds_configured: bool,
    pub forum_configured: bool,
    pub social_session: bool,
}

impl SourceReadiness {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            feeds_configured: !settings.feed_urls.is_empty(),
            forum_configured: !settings.forum_client_id.is_empty()
                && !settings.forum_client_secret.is_empty(),
            social_session: settings.social_cookies.is_some(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_or("PORT", 8000),
            frontend_url: var_or("FRONTEND_URL", "http://localhost:8081"),
            feed_urls: split_list(&var_or("FEED_URLS", DEFAULT_FEEDS)),
            forum_client_id: var_or("FORUM_CLIENT_ID", ""),
            forum_client_secret: var_or("FORUM_CLIENT_SECRET", ""),
            forum_user_agent: var_or("FORUM_USER_AGENT", "news-radar/0.1"),
            browser_url: var_or("BROWSER_URL", "http://localhost:3000"),
            browser_token: env::var("BROWSER_TOKEN").ok().filter(|t| !t.is_empty()),
            social_cookies: env::var("SOCIAL_COOKIES")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            redis_url: var_or("REDIS_URL", "redis://localhost:6379"),
            max_items_per_source: parse_or("MAX_ITEMS_PER_SOURCE", 10),
            cache_ttl_secs: parse_or("CACHE_TTL_SECS", 300),
            max_feed_age_days: parse_or("MAX_FEED_AGE_DAYS", 3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_empties() {
        let v = split_list(" a.example/rss , ,b.example/rss,");
        assert_eq!(v, vec!["a.example/rss".to_string(), "b.example/rss".into()]);
    }

    #[serial_test::serial]
    #[test]
    fn defaults_apply_without_env() {
        for k in [
            "HOST",
            "PORT",
            "FEED_URLS",
            "FORUM_CLIENT_ID",
            "BROWSER_TOKEN",
            "SOCIAL_COOKIES",
            "CACHE_TTL_SECS",
            "MAX_FEED_AGE_DAYS",
        ] {
            env::remove_var(k);
        }
        let s = Settings::from_env();
        assert_eq!(s.port, 8000);
        assert_eq!(s.cache_ttl_secs, 300);
        assert_eq!(s.max_feed_age_days, 3);
        assert_eq!(s.feed_urls.len(), 2);
        assert!(s.forum_client_id.is_empty());
        assert!(s.browser_token.is_none());
        assert!(s.social_cookies.is_none());
    }

    #[serial_test::serial]
    #[test]
    fn readiness_reflects_configured_services() {
        for k in ["FEED_URLS", "FORUM_CLIENT_ID", "FORUM_CLIENT_SECRET"] {
            env::remove_var(k);
        }
        env::set_var("SOCIAL_COOKIES", r#"[{"name":"auth","value":"x"}]"#);
        let r = SourceReadiness::from_settings(&Settings::from_env());
        assert!(r.feeds_configured); // built-in defaults
        assert!(!r.forum_configured); // needs both id and secret
        assert!(r.social_session);
        env::remove_var("SOCIAL_COOKIES");

        env::set_var("FORUM_CLIENT_ID", "id");
        env::set_var("FORUM_CLIENT_SECRET", "secret");
        env::set_var("FEED_URLS", " ");
        let r = SourceReadiness::from_settings(&Settings::from_env());
        assert!(!r.feeds_configured);
        assert!(r.forum_configured);
        assert!(!r.social_session);
        for k in ["FORUM_CLIENT_ID", "FORUM_CLIENT_SECRET", "FEED_URLS"] {
            env::remove_var(k);
        }
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_and_bad_numbers_fall_back() {
        env::set_var("PORT", "9100");
        env::set_var("CACHE_TTL_SECS", "not-a-number");
        env::set_var("FEED_URLS", "https://one.example/rss");
        let s = Settings::from_env();
        assert_eq!(s.port, 9100);
        assert_eq!(s.cache_ttl_secs, 300);
        assert_eq!(s.feed_urls, vec!["https://one.example/rss".to_string()]);
        env::remove_var("PORT");
        env::remove_var("CACHE_TTL_SECS");
        env::remove_var("FEED_URLS");
    }
}
