//! GraphQL calls against GitHub with retry and exponential backoff.
//!
//! A [`GraphqlTransport`] performs exactly one request; [`GraphqlClient`]
//! interprets the response envelope and retries transient failures
//! according to its [`RetryPolicy`].

use super::runner::{CommandRunner, is_transient_message};
use crate::config::RetrySettings;
use crate::error::{AnokyeError, Result};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// One GraphQL request: document, variables and opt-in preview features.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: Map<String, Value>,
    #[serde(skip)]
    pub features: Vec<String>,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn var(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    /// Request a `GraphQL-Features` preview (e.g. `sub_issues`).
    pub fn feature(mut self, feature: &str) -> Self {
        self.features.push(feature.to_string());
        self
    }
}

/// Sends a single request and returns the raw response body.
pub trait GraphqlTransport {
    fn execute(&self, request: &GraphqlRequest) -> Result<Value>;
}

/// Transport that shells out to `gh api graphql`.
pub struct GhTransport<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> GhTransport<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn build_args(request: &GraphqlRequest) -> Result<Vec<String>> {
        let mut args = vec![
            "api".to_string(),
            "graphql".to_string(),
            "-f".to_string(),
            format!("query={}", request.query),
        ];
        for feature in &request.features {
            args.push("-H".to_string());
            args.push(format!("GraphQL-Features: {}", feature));
        }
        for (name, value) in &request.variables {
            match value {
                Value::Null => {}
                Value::String(s) => {
                    args.push("-f".to_string());
                    args.push(format!("{}={}", name, s));
                }
                Value::Number(_) | Value::Bool(_) => {
                    args.push("-F".to_string());
                    args.push(format!("{}={}", name, value));
                }
                Value::Array(_) | Value::Object(_) => {
                    return Err(AnokyeError::Validation(format!(
                        "variable '{}' must be a scalar for the gh transport",
                        name
                    )));
                }
            }
        }
        Ok(args)
    }
}

impl<R: CommandRunner> GraphqlTransport for GhTransport<R> {
    fn execute(&self, request: &GraphqlRequest) -> Result<Value> {
        let args = Self::build_args(request)?;
        let output = self.runner.run("gh", &args, None)?;

        // gh exits non-zero on GraphQL-level errors but still prints the body.
        if !output.success() {
            if let Ok(body) = serde_json::from_str::<Value>(&output.stdout) {
                if body.get("errors").is_some() {
                    return Ok(body);
                }
            }
        }
        let stdout = output.into_success("gh")?;
        Ok(serde_json::from_str(&stdout)?)
    }
}

/// Transport that POSTs directly to the GraphQL endpoint.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str, token: String) -> Result<Self> {
        // reqwest is built without a bundled provider; the first caller installs ring.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("anokye/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AnokyeError::Http(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token,
        })
    }
}

impl GraphqlTransport for HttpTransport {
    fn execute(&self, request: &GraphqlRequest) -> Result<Value> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(request);
        for feature in &request.features {
            builder = builder.header("GraphQL-Features", feature.as_str());
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                AnokyeError::Transient(e.to_string())
            } else {
                AnokyeError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok());

        match status_failure(status, remaining) {
            Some(StatusFailure::Transient) => {
                return Err(AnokyeError::Transient(format!("HTTP {}", status)));
            }
            Some(StatusFailure::Permanent) => {
                let text = response.text().unwrap_or_default();
                return Err(AnokyeError::Http(format!("HTTP {}: {}", status, text.trim())));
            }
            None => {}
        }
        response
            .json::<Value>()
            .map_err(|e| AnokyeError::Http(format!("Failed to parse response: {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusFailure {
    Transient,
    Permanent,
}

/// How a non-success response should be treated. Secondary rate limits come
/// back as 403 with `x-ratelimit-remaining: 0`.
fn status_failure(status: StatusCode, ratelimit_remaining: Option<&str>) -> Option<StatusFailure> {
    if status.is_success() {
        None
    } else if status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
        || (status == StatusCode::FORBIDDEN && ratelimit_remaining == Some("0"))
    {
        Some(StatusFailure::Transient)
    } else {
        Some(StatusFailure::Permanent)
    }
}

/// Exponential backoff schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            multiplier: settings.multiplier,
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        if !millis.is_finite() || millis >= self.max_delay.as_millis() as f64 {
            self.max_delay
        } else {
            Duration::from_millis(millis.round() as u64)
        }
    }
}

type Sleeper = Box<dyn Fn(Duration)>;

pub struct GraphqlClient {
    transport: Box<dyn GraphqlTransport>,
    policy: RetryPolicy,
    sleep: Sleeper,
}

impl GraphqlClient {
    pub fn new(transport: Box<dyn GraphqlTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replace the function used to wait between attempts.
    pub fn with_sleeper(mut self, sleep: impl Fn(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// Run `request`, retrying transient failures, and return its `data` member.
    pub fn query(&self, request: &GraphqlRequest) -> Result<Value> {
        let mut attempt = 1;
        loop {
            let result = self
                .transport
                .execute(request)
                .and_then(extract_data);
            match result {
                Ok(data) => {
                    debug!(attempt, "GraphQL request succeeded");
                    return Ok(data);
                }
                Err(e) if e.is_transient() => {
                    if attempt >= self.policy.max_attempts {
                        return Err(AnokyeError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient GraphQL failure, backing off"
                    );
                    (self.sleep)(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Split a response envelope into its `data`, or the error it reports.
pub fn extract_data(mut body: Value) -> Result<Value> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            let joined = if messages.is_empty() {
                "unknown error".to_string()
            } else {
                messages.join("; ")
            };
            let rate_limited = errors
                .iter()
                .any(|e| e.get("type").and_then(Value::as_str) == Some("RATE_LIMITED"));
            if rate_limited || is_transient_message(&joined) {
                return Err(AnokyeError::Transient(joined));
            }
            let not_found = errors
                .iter()
                .all(|e| e.get("type").and_then(Value::as_str) == Some("NOT_FOUND"));
            if not_found {
                return Err(AnokyeError::NotFound(joined));
            }
            return Err(AnokyeError::GraphQl(joined));
        }
    }
    match body.get_mut("data").map(Value::take) {
        Some(Value::Null) | None => Err(AnokyeError::GraphQl("response has no data".to_string())),
        Some(data) => Ok(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_millis(350),
        }
    }

    fn client_with(
        runner: Rc<ScriptedRunner>,
        max_attempts: u32,
    ) -> (GraphqlClient, Rc<RefCell<Vec<Duration>>>) {
        let slept = Rc::new(RefCell::new(Vec::new()));
        let recorder = slept.clone();
        let client = GraphqlClient::new(Box::new(GhTransport::new(runner)), fast_policy(max_attempts))
            .with_sleeper(move |d| recorder.borrow_mut().push(d));
        (client, slept)
    }

    #[test]
    fn test_delay_schedule_is_capped() {
        let policy = fast_policy(5);
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(40), Duration::from_millis(350));
    }

    #[test]
    fn test_status_failure_classification() {
        assert_eq!(status_failure(StatusCode::OK, None), None);
        assert_eq!(
            status_failure(StatusCode::TOO_MANY_REQUESTS, None),
            Some(StatusFailure::Transient)
        );
        assert_eq!(
            status_failure(StatusCode::BAD_GATEWAY, Some("4000")),
            Some(StatusFailure::Transient)
        );
        assert_eq!(
            status_failure(StatusCode::FORBIDDEN, Some("0")),
            Some(StatusFailure::Transient)
        );
        assert_eq!(
            status_failure(StatusCode::FORBIDDEN, Some("12")),
            Some(StatusFailure::Permanent)
        );
        assert_eq!(
            status_failure(StatusCode::UNAUTHORIZED, None),
            Some(StatusFailure::Permanent)
        );
        assert_eq!(
            status_failure(StatusCode::NOT_FOUND, Some("0")),
            Some(StatusFailure::Permanent)
        );
    }

    #[test]
    fn test_gh_args_split_string_and_typed_vars() {
        let request = GraphqlRequest::new("query { viewer { login } }")
            .var("owner", "acme")
            .var("number", 7)
            .var("cursor", Value::Null)
            .feature("sub_issues");
        let args = GhTransport::<ScriptedRunner>::build_args(&request).unwrap();
        assert_eq!(
            args,
            vec![
                "api",
                "graphql",
                "-f",
                "query=query { viewer { login } }",
                "-H",
                "GraphQL-Features: sub_issues",
                "-F",
                "number=7",
                "-f",
                "owner=acme",
            ]
        );
    }

    #[test]
    fn test_gh_args_reject_objects() {
        let request = GraphqlRequest::new("q").var("input", json!({"a": 1}));
        assert!(GhTransport::<ScriptedRunner>::build_args(&request).is_err());
    }

    #[test]
    fn test_retries_transient_then_succeeds() {
        let runner = Rc::new(ScriptedRunner::new());
        runner
            .push_failure(1, "HTTP 502: Bad Gateway")
            .push_failure(1, "connection reset by peer")
            .push_ok(r#"{"data":{"viewer":{"login":"octocat"}}}"#);
        let (client, slept) = client_with(runner.clone(), 3);

        let data = client.query(&GraphqlRequest::new("q")).unwrap();
        assert_eq!(data["viewer"]["login"], "octocat");
        assert_eq!(runner.call_count(), 3);
        assert_eq!(
            *slept.borrow(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let runner = Rc::new(ScriptedRunner::new());
        runner
            .push_failure(1, "API rate limit exceeded")
            .push_failure(1, "API rate limit exceeded");
        let (client, slept) = client_with(runner.clone(), 2);

        let err = client.query(&GraphqlRequest::new("q")).unwrap_err();
        assert!(matches!(err, AnokyeError::RetriesExhausted { attempts: 2, .. }));
        assert_eq!(slept.borrow().len(), 1);
    }

    #[test]
    fn test_permanent_error_is_not_retried() {
        let runner = Rc::new(ScriptedRunner::new());
        runner.push_failure(1, "gh: Not Found (HTTP 404)");
        let (client, slept) = client_with(runner.clone(), 3);

        let err = client.query(&GraphqlRequest::new("q")).unwrap_err();
        assert!(matches!(err, AnokyeError::Command { .. }));
        assert_eq!(runner.call_count(), 1);
        assert!(slept.borrow().is_empty());
    }

    #[test]
    fn test_graphql_errors_in_body() {
        let runner = Rc::new(ScriptedRunner::new());
        runner.push_ok(
            r#"{"data":null,"errors":[{"type":"INVALID_CURSOR","message":"bad cursor"}]}"#,
        );
        let (client, slept) = client_with(runner, 3);
        let err = client.query(&GraphqlRequest::new("q")).unwrap_err();
        assert!(matches!(err, AnokyeError::GraphQl(ref m) if m == "bad cursor"));
        assert!(slept.borrow().is_empty());
    }

    #[test]
    fn test_extract_data_not_found() {
        let body = json!({
            "data": {"repository": {"issue": null}},
            "errors": [{"type": "NOT_FOUND", "message": "Could not resolve to an Issue with the number of 99."}]
        });
        let err = extract_data(body).unwrap_err();
        assert!(matches!(err, AnokyeError::NotFound(ref m) if m.contains("number of 99")));
    }

    #[test]
    fn test_extract_data_mixed_errors_stay_graphql() {
        let body = json!({"errors": [
            {"type": "NOT_FOUND", "message": "missing"},
            {"type": "FORBIDDEN", "message": "no access"}
        ]});
        assert!(matches!(extract_data(body).unwrap_err(), AnokyeError::GraphQl(_)));
    }

    #[test]
    fn test_extract_data_rate_limited_is_transient() {
        let body = json!({"errors": [{"type": "RATE_LIMITED", "message": "slow down"}]});
        assert!(extract_data(body).unwrap_err().is_transient());
    }

    #[test]
    fn test_extract_data_missing_data() {
        assert!(extract_data(json!({"data": null})).is_err());
    }
}
