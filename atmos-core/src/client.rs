use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::{
    config::Config,
    error::{AtmosError, Result},
    mapper::map_response,
    model::WeatherData,
    validate::validate_datetime,
};

pub mod transport;

pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for the `days` parameter of the forecast endpoint.
pub const MAX_FORECAST_DAYS: u32 = 14;

/// Status reported when the request never produced an HTTP response.
const TRANSPORT_FAILURE_STATUS: u16 = 500;

/// Upstream endpoints, relative to the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Current => "/current.json",
            Endpoint::Forecast => "/forecast.json",
        }
    }
}

/// Query parameters of a single request, without the API key.
pub type Query = Vec<(&'static str, String)>;

/// WeatherAPI.com client.
///
/// Holds only immutable configuration; every call is one GET round trip.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    transport: Arc<dyn Transport>,
}

impl WeatherClient {
    /// Fails with [`AtmosError::MissingCredential`] when `api_key` is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AtmosError::MissingCredential);
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            transport: Arc::new(HttpTransport::new()),
        })
    }

    /// Build a client from the stored configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key().ok_or(AtmosError::MissingCredential)?;

        let client = Self::new(api_key)?.with_timeout(config.timeout());
        Ok(match config.base_url.as_deref() {
            Some(url) if !url.is_empty() => client.with_base_url(url),
            _ => client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Current conditions for `city`, optionally localized to `language`.
    #[instrument(skip(self))]
    pub async fn get_current_weather(
        &self,
        city: &str,
        language: Option<&str>,
    ) -> Result<WeatherData> {
        let query = current_query(city, language)?;
        self.make_request(Endpoint::Current, query).await
    }

    /// Forecast for `city` over `days` days (1..=14).
    ///
    /// `date`, when given, must be `YYYY-MM-DD` and lie within the next 14 days.
    #[instrument(skip(self))]
    pub async fn get_forecast(
        &self,
        city: &str,
        days: u32,
        date: Option<&str>,
    ) -> Result<WeatherData> {
        let query = forecast_query(city, days, date)?;
        self.make_request(Endpoint::Forecast, query).await
    }

    fn url_for(&self, endpoint: Endpoint) -> String {
        let path = endpoint.path();
        debug_assert!(path.starts_with('/'), "endpoint path must start with '/'");
        format!("{}{}", self.base_url, path)
    }

    async fn make_request(&self, endpoint: Endpoint, mut query: Query) -> Result<WeatherData> {
        let url = self.url_for(endpoint);
        debug!(url = %url, params = ?query, "Sending request");

        query.push(("key", self.api_key.clone()));

        let res = self.transport.get(&url, &query, self.timeout).await.map_err(|e| {
            // Transports other than `HttpTransport` may echo the query back.
            let message = e.to_string().replace(self.api_key.as_str(), "<redacted>");
            warn!(url = %url, error = %message, "Transport failure");
            AtmosError::UpstreamRequestFailed { status: TRANSPORT_FAILURE_STATUS, message }
        })?;

        if !res.is_success() {
            warn!(url = %url, status = res.status, "Upstream returned an error status");
            return Err(AtmosError::UpstreamRequestFailed {
                status: res.status,
                message: error_message(res.status, &res.body),
            });
        }

        let payload: Map<String, Value> =
            serde_json::from_str(&res.body).map_err(|e| AtmosError::UpstreamRequestFailed {
                status: res.status,
                message: format!("Response body is not a JSON object: {e}"),
            })?;

        map_response(&payload)
    }
}

/// Query for the current-conditions endpoint; `lang` is left out when absent.
pub fn current_query(city: &str, language: Option<&str>) -> Result<Query> {
    if city.trim().is_empty() {
        return Err(AtmosError::missing("city"));
    }

    let mut query: Query = vec![("q", city.to_string())];
    if let Some(lang) = language.filter(|l| !l.is_empty()) {
        query.push(("lang", lang.to_string()));
    }
    Ok(query)
}

/// Query for the forecast endpoint; `days == 0` counts as not given.
pub fn forecast_query(city: &str, days: u32, date: Option<&str>) -> Result<Query> {
    if city.trim().is_empty() {
        return Err(AtmosError::missing("city"));
    }
    if days == 0 {
        return Err(AtmosError::missing("days"));
    }
    if days > MAX_FORECAST_DAYS {
        return Err(AtmosError::InvalidRange { days });
    }

    let mut query: Query = vec![("q", city.to_string()), ("days", days.to_string())];
    if let Some(dt) = date {
        validate_datetime(dt)?;
        query.push(("dt", dt.to_string()));
    }
    Ok(query)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Prefer the upstream `{"error": {"message": ...}}` text, then the raw body,
/// then the canonical reason phrase.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }

    let body = body.trim();
    if !body.is_empty() {
        return truncate_body(body);
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("An error occurred while making the API request.")
        .to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as Days, Local};
    use std::sync::Mutex;

    use crate::validate::DATE_FORMAT;

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        url: String,
        query: Vec<(String, String)>,
        timeout: Duration,
    }

    /// Replays one canned outcome and records every request.
    #[derive(Debug)]
    struct RecordingTransport {
        outcome: std::result::Result<TransportResponse, TransportError>,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingTransport {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(TransportResponse { status, body: body.to_string() }),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: TransportError) -> Arc<Self> {
            Arc::new(Self { outcome: Err(err), calls: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for RecordingTransport {
        async fn get(
            &self,
            url: &str,
            query: &[(&str, String)],
            timeout: Duration,
        ) -> std::result::Result<TransportResponse, TransportError> {
            self.calls.lock().expect("lock").push(Call {
                url: url.to_string(),
                query: query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                timeout,
            });
            self.outcome.clone()
        }
    }

    const MINIMAL_BODY: &str = r#"{"location": {"name": "Test City"}, "current": {"temp_c": 10.0}}"#;

    fn client_with(transport: Arc<RecordingTransport>) -> WeatherClient {
        WeatherClient::new("fake_key").expect("client").with_transport(transport)
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn days_from_today(days: i64) -> String {
        (Local::now().date_naive() + Days::days(days)).format(DATE_FORMAT).to_string()
    }

    #[test]
    fn new_keeps_key_and_default_base_url() {
        let client = WeatherClient::new("fake_key").expect("client");

        assert_eq!(client.api_key(), "fake_key");
        assert_eq!(client.base_url(), "http://api.weatherapi.com/v1");
        assert_eq!(client.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn empty_key_is_rejected_at_construction() {
        assert_eq!(WeatherClient::new("").unwrap_err(), AtmosError::MissingCredential);
        assert_eq!(WeatherClient::new("  ").unwrap_err(), AtmosError::MissingCredential);
    }

    #[test]
    fn from_config_requires_key() {
        let err = WeatherClient::from_config(&Config::default()).unwrap_err();
        assert_eq!(err, AtmosError::MissingCredential);
    }

    #[test]
    fn from_config_applies_overrides() {
        let config = Config {
            api_key: Some("KEY".into()),
            base_url: Some("http://localhost:8080/v1/".into()),
            timeout_secs: Some(2),
            ..Default::default()
        };

        let client = WeatherClient::from_config(&config).expect("client");
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
        assert_eq!(client.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn endpoint_paths_are_rooted() {
        for endpoint in [Endpoint::Current, Endpoint::Forecast] {
            assert!(endpoint.path().starts_with('/'));
        }
    }

    #[test]
    fn current_query_omits_absent_language() {
        assert_eq!(current_query("London", None), Ok(vec![("q", "London".to_string())]));
        assert_eq!(
            current_query("London", Some("fr")),
            Ok(vec![("q", "London".to_string()), ("lang", "fr".to_string())])
        );
        assert_eq!(current_query("London", Some("")), Ok(vec![("q", "London".to_string())]));
    }

    #[test]
    fn forecast_query_checks_arguments_in_order() {
        assert_eq!(forecast_query("", 5, None), Err(AtmosError::missing("city")));
        assert_eq!(forecast_query("Tokyo", 0, None), Err(AtmosError::missing("days")));
        assert_eq!(forecast_query("Tokyo", 15, None), Err(AtmosError::InvalidRange { days: 15 }));
        assert_eq!(
            forecast_query("Tokyo", 5, Some("2025/10/10")),
            Err(AtmosError::InvalidDateFormat("2025/10/10".into()))
        );
    }

    #[test]
    fn forecast_query_accepts_window_bounds() {
        assert!(forecast_query("Tokyo", 1, None).is_ok());
        assert!(forecast_query("Tokyo", 14, None).is_ok());
    }

    #[tokio::test]
    async fn current_weather_request_shape() {
        let transport = RecordingTransport::replying(200, MINIMAL_BODY);
        let client = client_with(transport.clone());

        let data = client.get_current_weather("London", None).await.expect("success");
        assert_eq!(data.location.and_then(|l| l.name).as_deref(), Some("Test City"));

        assert_eq!(
            transport.calls(),
            vec![Call {
                url: "http://api.weatherapi.com/v1/current.json".into(),
                query: pairs(&[("q", "London"), ("key", "fake_key")]),
                timeout: Duration::from_secs(10),
            }]
        );
    }

    #[tokio::test]
    async fn current_weather_sends_language() {
        let transport = RecordingTransport::replying(200, MINIMAL_BODY);
        let client = client_with(transport.clone());

        client.get_current_weather("London", Some("de")).await.expect("success");

        let calls = transport.calls();
        assert_eq!(calls[0].query, pairs(&[("q", "London"), ("lang", "de"), ("key", "fake_key")]));
    }

    #[tokio::test]
    async fn empty_city_fails_before_any_request() {
        let transport = RecordingTransport::replying(200, MINIMAL_BODY);
        let client = client_with(transport.clone());

        let err = client.get_current_weather("", None).await.unwrap_err();
        assert!(matches!(err, AtmosError::MissingRequiredField(_)));

        let err = client.get_forecast("", 5, None).await.unwrap_err();
        assert!(matches!(err, AtmosError::MissingRequiredField(_)));

        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn forecast_request_shape() {
        let transport = RecordingTransport::replying(200, MINIMAL_BODY);
        let client = client_with(transport.clone());
        let dt = days_from_today(5);

        client.get_forecast("Tokyo", 5, Some(dt.as_str())).await.expect("success");

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "http://api.weatherapi.com/v1/forecast.json");
        assert_eq!(
            calls[0].query,
            pairs(&[("q", "Tokyo"), ("days", "5"), ("dt", dt.as_str()), ("key", "fake_key")])
        );
    }

    #[tokio::test]
    async fn forecast_rejections_do_not_hit_the_network() {
        let transport = RecordingTransport::replying(200, MINIMAL_BODY);
        let client = client_with(transport.clone());

        let err = client.get_forecast("Tokyo", 15, None).await.unwrap_err();
        assert_eq!(err, AtmosError::InvalidRange { days: 15 });

        let err = client.get_forecast("Tokyo", 5, Some("2025/10/10")).await.unwrap_err();
        assert!(matches!(err, AtmosError::InvalidDateFormat(_)));

        let err = client.get_forecast("Tokyo", 5, Some(days_from_today(-1).as_str())).await.unwrap_err();
        assert!(matches!(err, AtmosError::OutOfRangeDate { .. }));

        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_carries_status_and_upstream_message() {
        let transport = RecordingTransport::replying(
            401,
            r#"{"error": {"code": 2006, "message": "API key is invalid."}}"#,
        );
        let client = client_with(transport);

        let err = client.get_current_weather("London", None).await.unwrap_err();
        assert_eq!(
            err,
            AtmosError::UpstreamRequestFailed { status: 401, message: "API key is invalid.".into() }
        );
    }

    #[tokio::test]
    async fn error_status_without_body_uses_reason_phrase() {
        let client = client_with(RecordingTransport::replying(503, ""));

        let err = client.get_current_weather("London", None).await.unwrap_err();
        assert_eq!(
            err,
            AtmosError::UpstreamRequestFailed { status: 503, message: "Service Unavailable".into() }
        );
    }

    #[tokio::test]
    async fn transport_failure_becomes_server_error() {
        let client = client_with(RecordingTransport::failing(TransportError::Timeout(
            "operation timed out".into(),
        )));

        let err = client.get_current_weather("London", None).await.unwrap_err();
        match err {
            AtmosError::UpstreamRequestFailed { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("timed out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_message_hides_api_key() {
        let client = client_with(RecordingTransport::failing(TransportError::Connect(
            "error sending request for url (http://localhost/current.json?q=London&key=fake_key)".into(),
        )));

        let err = client.get_current_weather("London", None).await.unwrap_err();
        match err {
            AtmosError::UpstreamRequestFailed { status, message } => {
                assert_eq!(status, 500);
                assert!(!message.contains("fake_key"), "key leaked: {message}");
                assert!(message.contains("key=<redacted>"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_object_body_is_an_upstream_failure() {
        let client = client_with(RecordingTransport::replying(200, "[1, 2, 3]"));

        let err = client.get_current_weather("London", None).await.unwrap_err();
        assert_eq!(err.status_code(), Some(200));
    }

    #[tokio::test]
    async fn mapper_failures_propagate_unchanged() {
        let client = client_with(RecordingTransport::replying(200, r#"{"current": {"temp_c": 1.0}}"#));

        let err = client.get_current_weather("London", None).await.unwrap_err();
        assert!(matches!(err, AtmosError::MissingRequiredField(_)));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let truncated = truncate_body(&long);

        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
