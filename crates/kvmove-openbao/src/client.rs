use kvmove_core::MigrateError;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Method, StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Address and credential for one server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct OpenBaoConfig {
    /// Base address, e.g. `https://bao.internal:8200`.
    pub addr: String,
    /// Client token; sent only when non-empty.
    #[serde(default)]
    pub token: String,
}

/// Thin wrapper over `reqwest` speaking the `/v1/<path>` logical API.
#[derive(Debug, Clone)]
pub struct OpenBaoClient {
    cfg: OpenBaoConfig,
    client: reqwest::Client,
}

impl OpenBaoClient {
    pub fn new(cfg: OpenBaoConfig) -> Self {
        Self {
            cfg,
            client: reqwest::Client::new(),
        }
    }

    pub fn addr(&self) -> &str {
        &self.cfg.addr
    }

    /// Full URL for a logical path such as `secret/data/app/db`.
    pub fn url(&self, logical_path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.cfg.addr.trim_end_matches('/'),
            logical_path.trim_start_matches('/')
        )
    }

    fn headers(&self) -> Result<HeaderMap, MigrateError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("kvmove"));
        if !self.cfg.token.is_empty() {
            let value = HeaderValue::from_str(&self.cfg.token).map_err(|e| {
                MigrateError::config(format!(
                    "token for {} is not a valid header value: {e}",
                    self.cfg.addr
                ))
            })?;
            headers.insert(TOKEN_HEADER, value);
        }
        Ok(headers)
    }

    /// `LIST` a logical path (sent as `GET ?list=true`).
    pub async fn list(
        &self,
        op: &'static str,
        logical_path: &str,
    ) -> Result<Option<Value>, MigrateError> {
        let url = format!("{}?list=true", self.url(logical_path));
        self.send(op, logical_path, Method::GET, url, None).await
    }

    pub async fn read(
        &self,
        op: &'static str,
        logical_path: &str,
    ) -> Result<Option<Value>, MigrateError> {
        let url = self.url(logical_path);
        self.send(op, logical_path, Method::GET, url, None).await
    }

    pub async fn write(
        &self,
        op: &'static str,
        logical_path: &str,
        body: &Value,
    ) -> Result<Option<Value>, MigrateError> {
        let url = self.url(logical_path);
        self.send(op, logical_path, Method::POST, url, Some(body)).await
    }

    /// One attempt, no retries. 404 maps to `None`; other non-success
    /// statuses become connection errors carrying the server's messages.
    #[instrument(skip_all, fields(op = %op, target = %logical_path))]
    async fn send(
        &self,
        op: &'static str,
        logical_path: &str,
        method: Method,
        url: String,
        body: Option<&Value>,
    ) -> Result<Option<Value>, MigrateError> {
        let conn_err = |reason: String| MigrateError::Connection {
            op,
            target: logical_path.to_string(),
            reason,
        };

        let mut request = self.client.request(method, &url).headers(self.headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| conn_err(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| conn_err(e.to_string()))?;
        debug!(%status, bytes = text.len(), "response");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(conn_err(error_reason(status, &text)));
        }
        parse_body(&text).ok_or_else(|| MigrateError::Shape {
            op,
            target: logical_path.to_string(),
            expected: "JSON body",
        })
        .map(Some)
    }
}

/// Parse a success body; an empty body (204) is `Null`.
pub(crate) fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return Some(Value::Null);
    }
    serde_json::from_str(text).ok()
}

/// The `data` object of a response envelope, if present and non-null.
pub(crate) fn envelope_data(body: Option<Value>) -> Option<Value> {
    match body {
        Some(Value::Object(mut map)) => match map.remove("data") {
            Some(Value::Null) | None => None,
            Some(data) => Some(data),
        },
        _ => None,
    }
}

/// Human-readable reason for a failed call, folding in `{"errors": [...]}`.
pub(crate) fn error_reason(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        errors: Vec<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => {
            format!("status {}: {}", status.as_u16(), parsed.errors.join("; "))
        }
        _ => format!("status {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use kvmove_core::ErrorKind;
    use serde_json::json;

    use super::*;

    fn client(addr: &str, token: &str) -> OpenBaoClient {
        OpenBaoClient::new(OpenBaoConfig {
            addr: addr.into(),
            token: token.into(),
        })
    }

    #[test]
    fn builds_v1_urls() {
        let c = client("http://127.0.0.1:8200/", "t");
        assert_eq!(c.url("secret/data/app"), "http://127.0.0.1:8200/v1/secret/data/app");
        assert_eq!(c.url("/transit/encrypt/k"), "http://127.0.0.1:8200/v1/transit/encrypt/k");
    }

    #[test]
    fn token_header_only_when_present() {
        let with = client("http://x", "s.abc").headers().expect("headers");
        assert_eq!(with.get(TOKEN_HEADER).unwrap(), "s.abc");
        let without = client("http://x", "").headers().expect("headers");
        assert!(without.get(TOKEN_HEADER).is_none());
    }

    #[test]
    fn folds_server_errors_into_reason() {
        let reason = error_reason(StatusCode::FORBIDDEN, r#"{"errors":["permission denied"]}"#);
        assert_eq!(reason, "status 403: permission denied");
        assert_eq!(error_reason(StatusCode::BAD_GATEWAY, "<html>"), "status 502");
    }

    #[test]
    fn envelope_data_ignores_null() {
        assert_eq!(
            envelope_data(Some(json!({ "data": { "keys": ["a"] } }))),
            Some(json!({ "keys": ["a"] }))
        );
        assert_eq!(envelope_data(Some(json!({ "data": null }))), None);
        assert_eq!(envelope_data(Some(Value::Null)), None);
        assert_eq!(envelope_data(None), None);
    }

    #[test]
    fn empty_success_body_is_null() {
        assert_eq!(parse_body(""), Some(Value::Null));
        assert_eq!(parse_body("{\"a\":1}"), Some(json!({ "a": 1 })));
        assert_eq!(parse_body("nope"), None);
    }

    #[test]
    fn body_numbers_keep_full_precision() {
        let body = parse_body(r#"{"data":{"big":123456789012345678901234567890,"fine":0.10000000000000000001}}"#)
            .expect("json");
        assert_eq!(body["data"]["big"].to_string(), "123456789012345678901234567890");
        assert_eq!(body["data"]["fine"].to_string(), "0.10000000000000000001");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        // Port 9 (discard) is almost never listening on loopback.
        let c = client("http://127.0.0.1:9", "");
        let err = c.read("read", "secret/data/x").await.expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Connection);
    }
}
