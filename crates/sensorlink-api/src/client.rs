// Backend API HTTP client
//
// Wraps `reqwest::Client` with URL construction, timeout mapping and
// `{success, error, message}` envelope handling. Endpoint groups (node,
// sampling, base station) are implemented as inherent methods in separate
// files to keep this module focused on transport mechanics.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const BODY_PREVIEW_CHARS: usize = 200;

/// Raw HTTP client for the sensor-node backend.
///
/// Every endpoint answers JSON that may carry `success`, `error` and
/// `message`. An explicit `success: false` becomes [`Error::Backend`] with
/// the backend's text; the caller only ever sees successful payloads.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl BackendClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    /// Build a node-scoped URL: `{base}/api/{action}/{node_id}`.
    pub(crate) fn node_url(&self, action: &str, node_id: u32) -> Result<Url, Error> {
        self.api_url(&format!("{action}/{node_id}"))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!(method = "GET", %url, "backend request");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.parse_envelope(resp).await
    }

    /// Send a POST request with a JSON body and unwrap the envelope.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!(method = "POST", %url, "backend request");

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.parse_envelope(resp).await
    }

    /// Send a body-less POST (node commands) and unwrap the envelope.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!(method = "POST", %url, "backend request");

        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.parse_envelope(resp).await
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Check HTTP status, then the `success` flag, then deserialize `T`
    /// from the same JSON object.
    ///
    /// The backend answers validation failures with HTTP 400 and a normal
    /// `{success: false, error}` body, so a JSON rejection is preferred over
    /// the bare status code.
    async fn parse_envelope<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        trace!(status = status.as_u16(), body_len = body.len(), "backend response");

        let parsed = serde_json::from_str::<Value>(&body);

        if !status.is_success() {
            if let Ok(value) = &parsed {
                if let Some(message) = rejection_message(value) {
                    return Err(Error::Backend { message });
                }
            }
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        let value = parsed.map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

        if let Some(message) = rejection_message(&value) {
            return Err(Error::Backend { message });
        }

        serde_json::from_value(value).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// `Some(text)` if the body is an explicit `success: false` envelope.
fn rejection_message(value: &Value) -> Option<String> {
    if value.get("success").and_then(Value::as_bool) != Some(false) {
        return None;
    }
    let text = ["error", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .unwrap_or("request failed");
    Some(text.to_owned())
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> BackendClient {
        BackendClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn urls_ignore_trailing_slash() {
        let a = client("http://127.0.0.1:5000/").node_url("read", 42).unwrap();
        let b = client("http://127.0.0.1:5000").node_url("read", 42).unwrap();
        assert_eq!(a.as_str(), "http://127.0.0.1:5000/api/read/42");
        assert_eq!(a, b);
    }

    #[test]
    fn urls_keep_path_prefix() {
        let url = client("https://bench.local/console")
            .api_url("sampling/status/7")
            .unwrap();
        assert_eq!(url.as_str(), "https://bench.local/console/api/sampling/status/7");
    }

    #[test]
    fn rejection_prefers_error_over_message() {
        let value = json!({"success": false, "error": "Node timeout", "message": "ignored"});
        assert_eq!(rejection_message(&value).as_deref(), Some("Node timeout"));

        let value = json!({"success": false, "message": "Base connect failed"});
        assert_eq!(rejection_message(&value).as_deref(), Some("Base connect failed"));

        let value = json!({"success": false});
        assert_eq!(rejection_message(&value).as_deref(), Some("request failed"));
    }

    #[test]
    fn missing_success_is_not_a_rejection() {
        assert_eq!(rejection_message(&json!({"connected": false})), None);
        assert_eq!(rejection_message(&json!({"success": true, "error": "x"})), None);
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let body = "é".repeat(300);
        assert_eq!(preview(&body).chars().count(), BODY_PREVIEW_CHARS);
    }
}
