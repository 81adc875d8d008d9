//! HTTP client for the exam platform API with safe logging.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

const CLIENT_USER_AGENT: &str = concat!("question-import/", env!("CARGO_PKG_VERSION"));

/// Query parameter keys (case-insensitive) whose values are redacted in logs.
const SENSITIVE_QUERY_PARAMS: &[&str] = &[
    "access_token",
    "api_token",
    "token",
    "key",
    "session",
    "authorization",
];

// ─────────────────────────────────────────────────────────────────────────────
// LoggingMode
// ─────────────────────────────────────────────────────────────────────────────

/// Controls how URLs are sanitized for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggingMode {
    /// Log only the path component.
    /// Example: `/api/subjects`
    PathOnly,

    /// Log path and query parameters, with sensitive values redacted.
    /// Example: `/api/subjects?category=64f0&status=active&token=***`
    #[default]
    PathAndQueryRedacted,
}

fn is_sensitive_param(key: &str) -> bool {
    let key_lower = key.to_ascii_lowercase();
    SENSITIVE_QUERY_PARAMS
        .iter()
        .any(|&sensitive| key_lower == sensitive)
}

/// Sanitizes a URL for logging. The result never contains the scheme, host
/// or fragment.
pub fn sanitize_url_for_logs(url: &Url, mode: LoggingMode) -> String {
    let path = url.path();

    match mode {
        LoggingMode::PathOnly => path.to_string(),
        LoggingMode::PathAndQueryRedacted => {
            let pairs: Vec<String> = url
                .query_pairs()
                .map(|(key, value)| {
                    if is_sensitive_param(&key) {
                        format!("{}=***", key)
                    } else {
                        format!("{}={}", key, value)
                    }
                })
                .collect();

            if pairs.is_empty() {
                path.to_string()
            } else {
                format!("{}?{}", path, pairs.join("&"))
            }
        }
    }
}

/// Shortens an id for logging (first 8 chars).
pub(crate) fn redact_id(id: &str) -> String {
    if id.chars().count() > 8 {
        format!("{}...", id.chars().take(8).collect::<String>())
    } else {
        id.to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// QuestionApiClient
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the platform REST API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct QuestionApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    logging_mode: LoggingMode,
}

impl std::fmt::Debug for QuestionApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("logging_mode", &self.logging_mode)
            .finish()
    }
}

impl QuestionApiClient {
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client fails to initialize.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let http = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            token: config.api_token.clone(),
            logging_mode: LoggingMode::default(),
        })
    }

    pub fn with_logging_mode(mut self, mode: LoggingMode) -> Self {
        self.logging_mode = mode;
        self
    }

    /// Joins an API path onto the base URL and appends query pairs.
    ///
    /// A base URL with a path prefix (`https://host/admin`) keeps the prefix.
    pub fn build_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, AppError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }

        let mut url = base
            .join(path.trim_start_matches('/'))
            .map_err(|_| AppError::Internal(format!("Invalid path: {}", path)))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub(crate) async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, AppError> {
        let url = self.build_url(path, query)?;
        self.execute(Method::GET, url, None).await
    }

    pub(crate) async fn post_json<B>(&self, path: &str, body: &B) -> Result<reqwest::Response, AppError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.build_url(path, &[])?;
        let bytes = serde_json::to_vec(body)
            .map_err(|e| AppError::Internal(format!("Failed to serialize request: {}", e)))?;
        self.execute(Method::POST, url, Some(bytes)).await
    }

    /// Sends a request with timing and sanitized logging.
    ///
    /// Never logs headers or bodies. A transport failure is mapped to a
    /// generic message so the raw reqwest error (which carries the full URL)
    /// never reaches the user.
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, AppError> {
        let start = Instant::now();
        let sanitized_url = sanitize_url_for_logs(&url, self.logging_mode);

        let mut request = self.http.request(method.clone(), url.as_str());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(bytes) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let result = request.send().await;
        let duration_ms = start.elapsed().as_millis();

        match result {
            Ok(response) => {
                info!(
                    "[API] {} {} {} {}ms",
                    method,
                    sanitized_url,
                    response.status().as_u16(),
                    duration_ms
                );
                Ok(response)
            }
            Err(e) => {
                let kind = if e.is_timeout() { "TIMEOUT" } else { "FAILED" };
                warn!("[API] {} {} {} {}ms", method, sanitized_url, kind, duration_ms);
                Err(AppError::RequestFailed(
                    "Connection to the server failed".to_string(),
                ))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Reads the whole response body as text.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, AppError> {
    response
        .text()
        .await
        .map_err(|_| AppError::InvalidResponse("Failed to read response body".to_string()))
}

/// Parses a JSON body, treating an empty body as an invalid response.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::InvalidResponse(
            "Empty response from server".to_string(),
        ));
    }
    serde_json::from_str(body).map_err(|e| AppError::InvalidResponse(e.to_string()))
}

/// Maps a non-2xx status to `RequestFailed`.
pub(crate) fn http_status_error(status: reqwest::StatusCode) -> AppError {
    AppError::RequestFailed(format!("HTTP error! status: {}", status.as_u16()))
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(uri: &str, token: Option<&str>) -> QuestionApiClient {
        let mut config = AppConfig::from_url(uri).unwrap();
        if let Some(token) = token {
            config = config.with_token(token);
        }
        QuestionApiClient::new(&config).unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // URL Sanitization Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn sanitize_strips_scheme_host_and_fragment() {
        let url = Url::parse("https://exam.example.com/api/questions?x=1#frag").unwrap();

        assert_eq!(sanitize_url_for_logs(&url, LoggingMode::PathOnly), "/api/questions");
        let redacted = sanitize_url_for_logs(&url, LoggingMode::PathAndQueryRedacted);
        assert_eq!(redacted, "/api/questions?x=1");
        assert!(!redacted.contains("exam.example.com"));
    }

    #[test]
    fn sanitize_redacts_sensitive_query_values() {
        let url = Url::parse(
            "https://exam.example.com/api/subjects?category=c1&Token=abc123&status=active",
        )
        .unwrap();

        let result = sanitize_url_for_logs(&url, LoggingMode::PathAndQueryRedacted);

        assert!(result.contains("category=c1"));
        assert!(result.contains("status=active"));
        assert!(result.contains("Token=***"));
        assert!(!result.contains("abc123"));
    }

    #[test]
    fn sensitive_params_need_exact_match() {
        assert!(is_sensitive_param("API_TOKEN"));
        assert!(!is_sensitive_param("tokens"));
        assert!(!is_sensitive_param("category"));
    }

    #[test]
    fn redact_id_keeps_first_eight_chars() {
        assert_eq!(redact_id("64f0c2a9b1e8d7f6a5b4c3d2"), "64f0c2a9...");
        assert_eq!(redact_id("short"), "short");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // URL Building Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn build_url_joins_path_and_encodes_query() {
        let client = client_for("https://exam.example.com", None);
        let url = client
            .build_url("/api/subjects", &[("category", "a b"), ("status", "active")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://exam.example.com/api/subjects?category=a+b&status=active"
        );
    }

    #[test]
    fn build_url_keeps_base_path_prefix() {
        let client = client_for("https://exam.example.com/admin", None);
        let url = client.build_url("/api/questions", &[]).unwrap();
        assert_eq!(url.as_str(), "https://exam.example.com/admin/api/questions");
    }

    #[test]
    fn client_with_logging_mode_changes_mode() {
        let client = client_for("https://exam.example.com", None);
        assert_eq!(client.logging_mode, LoggingMode::PathAndQueryRedacted);

        let client = client.with_logging_mode(LoggingMode::PathOnly);
        assert_eq!(client.logging_mode, LoggingMode::PathOnly);
    }

    #[test]
    fn client_debug_redacts_token() {
        let client = client_for("https://exam.example.com", Some("secret-token-xyz"));
        let debug_output = format!("{:?}", client);
        assert!(!debug_output.contains("secret-token-xyz"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn requests_carry_bearer_token_when_configured() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server.uri(), Some("test_token"));

        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .and(query_param("status", "active"))
            .and(header("Authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = client
            .get("/api/categories", &[("status", "active")])
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn requests_have_no_authorization_without_token() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server.uri(), None);

        Mock::given(method("POST"))
            .and(path("/api/questions"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;

        client
            .post_json("/api/questions", &serde_json::json!({"a": 1}))
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn transport_failure_is_request_failed() {
        // Port 1 is reserved and never has a listener.
        let client = client_for("http://127.0.0.1:1", Some("test_token"));

        let err = client.get("/api/categories", &[]).await.unwrap_err();
        match err {
            AppError::RequestFailed(msg) => assert!(!msg.contains("127.0.0.1")),
            e => panic!("Expected RequestFailed, got: {:?}", e),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Body Parsing Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn empty_body_is_invalid_response() {
        let err = parse_body::<serde_json::Value>("  ").unwrap_err();
        assert!(matches!(err, AppError::InvalidResponse(_)));
    }

    #[test]
    fn garbage_body_is_invalid_response() {
        let err = parse_body::<serde_json::Value>("<html>").unwrap_err();
        assert!(matches!(err, AppError::InvalidResponse(_)));
    }

    #[test]
    fn status_error_names_code() {
        let err = http_status_error(reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Request failed: HTTP error! status: 502");
    }
}
