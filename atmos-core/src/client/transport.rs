use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Status line and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below HTTP: nothing usable came back from the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(describe(err))
        } else if err.is_connect() {
            TransportError::Connect(describe(err))
        } else {
            TransportError::Request(describe(err))
        }
    }
}

/// Flattens the error chain. The URL is dropped first: it carries the API key.
fn describe(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut text = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

/// Performs GET requests on behalf of [`WeatherClient`](super::WeatherClient).
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let res = self.http.get(url).query(query).timeout(timeout).send().await?;

        let status = res.status().as_u16();
        let body = res.text().await?;

        Ok(TransportResponse { status, body })
    }
}
