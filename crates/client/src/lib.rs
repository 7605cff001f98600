use std::env;

use careconnect_core::{Coordinate, ServiceRecord};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const API_BASE_URL_ENV: &str = "CARECONNECT_API_BASE_URL";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid API base url {0}")]
    InvalidBaseUrl(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error: {status_text}")]
    Status { status: u16, status_text: String },
    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(error) | Self::Decode(error) => error.status().map(|s| s.as_u16()),
            Self::InvalidBaseUrl(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        env::var(API_BASE_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, location: &Coordinate) -> Self {
        Self {
            message: message.into(),
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

pub trait CareApi: Send + Sync {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;
    async fn fetch_service(&self, id: &str) -> Result<ServiceRecord, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("careconnect/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, config)
    }

    pub fn with_client(client: Client, config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| ApiError::InvalidBaseUrl(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(config.base_url.clone()));
        }

        Ok(Self { client, base_url })
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(&ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl CareApi for ApiClient {
    #[instrument(skip(self, request), fields(base_url = %self.base_url))]
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        let url = self.endpoint(&["api", "chat"])?;
        let response = self.client.post(url).json(request).send().await?;
        let reply: ChatReply = decode(response, "/api/chat").await?;
        info!(reply_len = reply.reply.len(), "chat reply received");
        Ok(reply)
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_service(&self, id: &str) -> Result<ServiceRecord, ApiError> {
        let url = self.endpoint(&["api", "services", id])?;
        let response = self.client.get(url).send().await?;
        let record: ServiceRecord = decode(response, "/api/services").await?;
        info!(service_id = %record.id, "service details received");
        Ok(record)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: Response,
    endpoint: &str,
) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        warn!(endpoint, status = status.as_u16(), %status_text, "API request failed");
        return Err(ApiError::Status {
            status: status.as_u16(),
            status_text,
        });
    }

    response.json().await.map_err(ApiError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_trims_trailing_slash() {
        let config = ClientConfig::new("https://api.example.org/ ");
        assert_eq!(config.base_url, "https://api.example.org");
        assert_eq!(ClientConfig::default().base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn config_from_env_defaults_and_trims() {
        env::remove_var(API_BASE_URL_ENV);
        assert_eq!(ClientConfig::from_env().base_url, DEFAULT_API_BASE_URL);

        env::set_var(API_BASE_URL_ENV, "   ");
        assert_eq!(ClientConfig::from_env().base_url, DEFAULT_API_BASE_URL);

        env::set_var(API_BASE_URL_ENV, "https://care.example.org/");
        assert_eq!(ClientConfig::from_env().base_url, "https://care.example.org");
        assert_eq!(
            ApiClient::from_env().unwrap().base_url().as_str(),
            "https://care.example.org/"
        );

        env::remove_var(API_BASE_URL_ENV);
    }

    #[test]
    fn endpoints_keep_base_path_and_escape_ids() {
        let client = ApiClient::new(&ClientConfig::new("http://localhost:8000/v2/")).unwrap();
        assert_eq!(
            client.endpoint(&["api", "chat"]).unwrap().as_str(),
            "http://localhost:8000/v2/api/chat"
        );
        assert_eq!(
            client.endpoint(&["api", "services", "a b/c"]).unwrap().as_str(),
            "http://localhost:8000/v2/api/services/a%20b%2Fc"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            ApiClient::new(&ClientConfig::new("not a url")),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            ApiClient::new(&ClientConfig::new("mailto:help@example.org")),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn chat_request_carries_coordinates() {
        let request = ChatRequest::new("need food", &Coordinate::new(12.9716, 77.5946));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "message": "need food", "latitude": 12.9716, "longitude": 77.5946 })
        );
    }
}
