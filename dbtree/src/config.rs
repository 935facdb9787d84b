use std::num::NonZeroU32;
use std::time::Duration;

use dbtree_core::AggregateOptions;

const DEFAULT_API_URL: &str = "https://api.dropbox.com";
const DEFAULT_OAUTH_URL: &str = "https://www.dropbox.com";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub access_token: Option<String>,
    pub app_key: Option<String>,
    pub app_secret: Option<String>,
    pub api_url: String,
    pub oauth_url: String,
    pub full_sync: bool,
    pub max_pages: Option<NonZeroU32>,
    pub initial_cursor: Option<String>,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            access_token: read_string_env(&lookup, "DROPBOX_ACCESS_TOKEN"),
            app_key: read_string_env(&lookup, "DROPBOX_APP_KEY"),
            app_secret: read_string_env(&lookup, "DROPBOX_APP_SECRET"),
            api_url: read_string_env(&lookup, "DROPBOX_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            oauth_url: read_string_env(&lookup, "DROPBOX_OAUTH_URL")
                .unwrap_or_else(|| DEFAULT_OAUTH_URL.to_string()),
            full_sync: read_bool_env(&lookup, "DBTREE_FULL_SYNC", true),
            max_pages: lookup("DBTREE_MAX_PAGES").and_then(|value| value.trim().parse().ok()),
            initial_cursor: None,
            http_timeout: Duration::from_secs(read_u64_env(
                &lookup,
                "DBTREE_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
        }
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            full_sync: self.full_sync,
            max_pages: self.max_pages,
        }
    }
}

fn read_string_env<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn read_u64_env<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn read_bool_env<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}
