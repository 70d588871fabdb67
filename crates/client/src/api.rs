//! Request pipeline: bearer token in, envelope-unwrapped JSON out.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{extract_message, ApiError, FALLBACK_MESSAGE};
use crate::session::Session;
use crate::transport::{HttpRequest, Method, ReqwestTransport, Transport};

/// Optional parts of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub body: Option<Value>,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("failed to serialize request body: {e}")))?;
        Ok(Self::new().with_body(body))
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// `resultCode` part of the response envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultCode {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub http_code: Option<u16>,
}

impl ResultCode {
    pub fn is_ok(&self) -> bool {
        self.value.as_deref().is_none_or(|v| v == "OK")
    }
}

/// A successful response after envelope unwrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Present when the backend wrapped the payload in an envelope.
    pub result_code: Option<ResultCode>,
    /// The `result` of an envelope, or the whole body otherwise.
    pub data: Value,
}

impl ApiResponse {
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.data).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// HTTP client wrapper shared by the session and every resource store.
///
/// Cheap to clone; clones share the transport and the session.
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
}

impl core::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("status", &self.session.status())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        Self {
            config,
            transport,
            session,
        }
    }

    /// Client over a real `reqwest` transport.
    pub fn with_reqwest(config: ClientConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let transport =
            ReqwestTransport::new(&config).map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self::new(config, Arc::new(transport), session))
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request and unwrap the envelope, without decoding the payload.
    ///
    /// A 401/403 from an authenticated endpoint ends the session as a side
    /// effect before the error is returned.
    pub async fn send_raw(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let request = HttpRequest {
            method,
            url: self.config.url(path),
            query: options.params,
            headers: options.headers,
            bearer: self.session.persisted_token(),
            body: options.body,
        };

        tracing::debug!(%method, path, "sending request");

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, path, error = %e, "request failed");
                return Err(ApiError::Transport(e.to_string()));
            }
        };

        let status = response.status;
        if matches!(status, 401 | 403) && !is_public(path) {
            tracing::warn!(%method, path, status, "authentication rejected; ending session");
            self.session.force_logout(status);
            return Err(ApiError::Unauthorized { status });
        }

        let (result_code, data) = split_envelope(parse_body(&response.body));

        if let Some(rc) = &result_code {
            match rc.http_code {
                Some(code) if code != 200 => return Err(envelope_error(code, rc, data)),
                _ if !response.is_success() => return Err(envelope_error(status, rc, data)),
                _ => {}
            }
        } else if !response.is_success() {
            let message = extract_message(&data)
                .unwrap_or_else(|| format!("request failed with HTTP {status}"));
            return Err(ApiError::Status {
                status,
                message,
                body: data,
            });
        }

        Ok(ApiResponse {
            status,
            result_code,
            data,
        })
    }

    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send_raw(method, path, options).await?.decode()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::Get, path, RequestOptions::new()).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::Post, path, RequestOptions::json(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::Put, path, RequestOptions::json(body)?).await
    }

    /// DELETE, ignoring whatever body the backend returns.
    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<(), ApiError> {
        self.send_raw(Method::Delete, path, options).await.map(|_| ())
    }
}

fn is_public(path: &str) -> bool {
    path.trim_start_matches('/').starts_with("public/")
}

/// Non-JSON bodies (e.g. a bare token) are surfaced as JSON strings.
fn parse_body(body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn split_envelope(body: Value) -> (Option<ResultCode>, Value) {
    match body {
        Value::Object(mut map) if map.get("resultCode").is_some_and(Value::is_object) => {
            let result_code = map
                .remove("resultCode")
                .and_then(|rc| serde_json::from_value::<ResultCode>(rc).ok());
            let result = map.remove("result").unwrap_or(Value::Null);
            // Some rejections put the explanation next to `result`.
            let result = match (result, map.remove("details")) {
                (Value::Null, Some(details)) => details,
                (result, _) => result,
            };
            (result_code, result)
        }
        other => (None, other),
    }
}

fn envelope_error(http_code: u16, rc: &ResultCode, payload: Value) -> ApiError {
    let message = extract_message(&payload)
        .or_else(|| rc.value.clone())
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
    ApiError::Envelope {
        http_code,
        code: rc.value.clone(),
        message,
        payload,
    }
}
