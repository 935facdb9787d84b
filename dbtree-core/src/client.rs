use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::aggregator::{ChangeFeed, FeedError};
use crate::record::ChangeRecord;

const DEFAULT_BASE_URL: &str = "https://api.dropbox.com";

#[derive(Debug, Error)]
pub enum DropboxError {
    #[error("access token is missing")]
    MissingCredential,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorClass {
    Auth,
    RateLimit,
    Transient,
    Permanent,
}

#[derive(Clone)]
pub struct DropboxClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl DropboxClient {
    pub fn new(token: impl Into<String>) -> Result<Self, DropboxError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: impl Into<String>) -> Result<Self, DropboxError> {
        Self::with_http_client(Client::new(), base_url, token)
    }

    /// Builds a client around a preconfigured `reqwest::Client` (timeouts,
    /// proxies). Fails before any request when the token is blank.
    pub fn with_http_client(
        http: Client,
        base_url: &str,
        token: impl Into<String>,
    ) -> Result<Self, DropboxError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DropboxError::MissingCredential);
        }
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            token,
        })
    }

    pub async fn delta(&self, cursor: Option<&str>) -> Result<DeltaPage, DropboxError> {
        let url = self.endpoint("/1/delta")?;
        let mut form = Vec::new();
        if let Some(cursor) = cursor {
            form.push(("cursor", cursor));
        }
        let response = self
            .http
            .post(url)
            .header("Authorization", self.auth_header_value())
            .form(&form)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn account_info(&self) -> Result<AccountInfo, DropboxError> {
        let url = self.endpoint("/1/account/info")?;
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    fn auth_header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DropboxError> {
        Ok(self.base_url.join(path)?)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DropboxError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DropboxError::Api { status, body })
        }
    }
}

impl ChangeFeed for DropboxClient {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<DeltaPage, FeedError> {
        self.delta(cursor).await.map_err(FeedError::from)
    }
}

impl From<DropboxError> for FeedError {
    fn from(err: DropboxError) -> Self {
        let auth = matches!(err, DropboxError::MissingCredential)
            || err.classification() == Some(ApiErrorClass::Auth);
        if auth {
            FeedError::auth(err)
        } else {
            FeedError::new(err)
        }
    }
}

impl DropboxError {
    pub fn classification(&self) -> Option<ApiErrorClass> {
        match self {
            DropboxError::Api { status, .. } => Some(classify_api_status(*status)),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.classification(),
            Some(ApiErrorClass::RateLimit | ApiErrorClass::Transient)
        )
    }
}

fn classify_api_status(status: StatusCode) -> ApiErrorClass {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        ApiErrorClass::Auth
    } else if matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
    ) {
        // The v1 API signals throttling with 503 as well as 429.
        ApiErrorClass::RateLimit
    } else if status == StatusCode::INSUFFICIENT_STORAGE {
        ApiErrorClass::Permanent
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        ApiErrorClass::Transient
    } else {
        ApiErrorClass::Permanent
    }
}

/// One page of the change feed.
#[derive(Debug, Deserialize, Serialize)]
pub struct DeltaPage {
    pub entries: Vec<(String, Option<ChangeRecord>)>,
    pub cursor: String,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub reset: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AccountInfo {
    pub display_name: String,
    #[serde(default)]
    pub uid: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub quota_info: QuotaInfo,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QuotaInfo {
    #[serde(default)]
    pub normal: u64,
    #[serde(default)]
    pub shared: u64,
    #[serde(default)]
    pub quota: u64,
}
