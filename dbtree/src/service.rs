use std::path::Path;

use dbtree_core::{
    AggregationError, DeltaAggregator, DeltaMapping, DeltaOutcome, DropboxClient, DropboxError,
    OAuthClient, OAuthError, TreeInvariantViolation, TreeNode, build_tree,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;
use crate::format::format_size;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no access token configured; set DROPBOX_ACCESS_TOKEN or pass --token")]
    MissingCredential,
    #[error("DROPBOX_APP_KEY and DROPBOX_APP_SECRET are required for oauth")]
    MissingAppCredentials,
    #[error("dropbox api error: {0}")]
    Api(#[from] DropboxError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error("change feed is inconsistent: {0}")]
    Tree(#[from] TreeInvariantViolation),
    #[error("oauth error: {0}")]
    OAuth(#[from] OAuthError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid mapping json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct QuotaSummary {
    pub display_name: String,
    pub normal: String,
    pub shared: String,
}

impl QuotaSummary {
    pub fn line(&self) -> String {
        format!("Normal: {} | Shared: {}", self.normal, self.shared)
    }
}

pub fn dropbox_client(config: &AppConfig) -> Result<DropboxClient, ServiceError> {
    let token = config
        .access_token
        .as_deref()
        .ok_or(ServiceError::MissingCredential)?;
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(DropboxError::from)?;
    DropboxClient::with_http_client(http, &config.api_url, token).map_err(|err| match err {
        DropboxError::MissingCredential => ServiceError::MissingCredential,
        other => other.into(),
    })
}

pub fn oauth_client(config: &AppConfig) -> Result<OAuthClient, ServiceError> {
    match (&config.app_key, &config.app_secret) {
        (Some(key), Some(secret)) => Ok(OAuthClient::with_base_urls(
            &config.oauth_url,
            &config.api_url,
            key.clone(),
            secret.clone(),
        )?),
        _ => Err(ServiceError::MissingAppCredentials),
    }
}

pub async fn fetch_mapping(config: &AppConfig) -> Result<DeltaOutcome, ServiceError> {
    let client = dropbox_client(config)?;
    let aggregator = DeltaAggregator::new(client, config.aggregate_options());
    let outcome = aggregator.aggregate(config.initial_cursor.clone()).await?;
    info!(
        pages = outcome.pages,
        cursor = outcome.cursor.as_deref().unwrap_or_default(),
        "fetched change feed"
    );
    Ok(outcome)
}

/// A tree built from the feed plus where aggregation stopped.
#[derive(Debug)]
pub struct FetchedTree {
    pub tree: TreeNode,
    pub cursor: Option<String>,
    pub truncated: bool,
}

pub async fn fetch_tree(config: &AppConfig) -> Result<FetchedTree, ServiceError> {
    let outcome = fetch_mapping(config).await?;
    Ok(FetchedTree {
        tree: build_tree(&outcome.mapping)?,
        cursor: outcome.cursor,
        truncated: outcome.truncated,
    })
}

pub async fn load_mapping_file(path: &Path) -> Result<DeltaMapping, ServiceError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn quota_summary(config: &AppConfig) -> Result<QuotaSummary, ServiceError> {
    let client = dropbox_client(config)?;
    let info = client.account_info().await?;
    Ok(QuotaSummary {
        display_name: info.display_name,
        normal: format_size(info.quota_info.normal),
        shared: format_size(info.quota_info.shared),
    })
}
