use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::blocking::{multipart::Form, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    ApiError, DecisionEngineApi, DocumentListResponse, EvaluateRequest, LoginResponse,
    RegisterRequest,
};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

pub const REGISTER_ENDPOINT: &str = "/register";
pub const LOGIN_ENDPOINT: &str = "/login";
pub const DOCUMENTS_ENDPOINT: &str = "/documents";
pub const PERSISTENT_EVALUATE_ENDPOINT: &str = "/evaluate";
pub const DYNAMIC_EVALUATE_ENDPOINT: &str = "/evaluate-with-docs";

const UNKNOWN_ERROR_DETAIL: &str = "Unknown error";
const LOGIN_ERROR_DETAIL: &str = "Invalid credentials";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Connection settings for [`ApiClient`].
pub struct ApiConfig {
    pub api_base: String,
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
/// Blocking client for the decision-engine REST API.
pub struct ApiClient {
    client: Client,
    api_base: String,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let api_base = config.api_base.trim().trim_end_matches('/').to_string();
        if api_base.is_empty() {
            return Err(ApiError::InvalidConfig("api base cannot be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .map_err(|source| ApiError::Connection {
                api_base: api_base.clone(),
                source,
            })?;

        Ok(Self { client, api_base })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.api_base)
    }

    fn send(
        &self,
        method: &'static str,
        endpoint: &'static str,
        request: RequestBuilder,
        default_detail: &str,
    ) -> Result<String, ApiError> {
        let started = Instant::now();
        let response = request.send().map_err(|source| {
            tracing::warn!(method, endpoint, error = %source, "decision engine request failed");
            ApiError::Connection {
                api_base: self.api_base.clone(),
                source,
            }
        })?;
        let status = response.status();
        let body = response.text().map_err(|source| ApiError::Connection {
            api_base: self.api_base.clone(),
            source,
        })?;
        tracing::debug!(
            method,
            endpoint,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "decision engine request completed"
        );

        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                detail: extract_error_detail(&body, default_detail),
            });
        }
        Ok(body)
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        method: &'static str,
        endpoint: &'static str,
        request: RequestBuilder,
        default_detail: &str,
    ) -> Result<T, ApiError> {
        let body = self.send(method, endpoint, request, default_detail)?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl DecisionEngineApi for ApiClient {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        let builder = self
            .client
            .post(self.endpoint_url(REGISTER_ENDPOINT))
            .json(request);
        self.send("POST", REGISTER_ENDPOINT, builder, UNKNOWN_ERROR_DETAIL)?;
        Ok(())
    }

    fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let builder = self
            .client
            .post(self.endpoint_url(LOGIN_ENDPOINT))
            .form(&[("username", email), ("password", password)]);
        let response: LoginResponse =
            self.send_json("POST", LOGIN_ENDPOINT, builder, LOGIN_ERROR_DETAIL)?;
        if response.access_token.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "login response carried an empty access_token".to_string(),
            ));
        }
        tracing::debug!(
            token_type = response.token_type.as_deref().unwrap_or("unspecified"),
            "login token issued"
        );
        Ok(response)
    }

    fn list_documents(&self, token: &str) -> Result<Vec<String>, ApiError> {
        let builder = self
            .client
            .get(self.endpoint_url(DOCUMENTS_ENDPOINT))
            .bearer_auth(token);
        let response: DocumentListResponse =
            self.send_json("GET", DOCUMENTS_ENDPOINT, builder, UNKNOWN_ERROR_DETAIL)?;
        Ok(response.documents)
    }

    fn evaluate(&self, token: &str, request: &EvaluateRequest) -> Result<Value, ApiError> {
        let builder = self
            .client
            .post(self.endpoint_url(PERSISTENT_EVALUATE_ENDPOINT))
            .bearer_auth(token)
            .json(request);
        self.send_json(
            "POST",
            PERSISTENT_EVALUATE_ENDPOINT,
            builder,
            UNKNOWN_ERROR_DETAIL,
        )
    }

    fn evaluate_with_documents(
        &self,
        token: &str,
        query: &str,
        paths: &[&Path],
    ) -> Result<Value, ApiError> {
        let mut form = Form::new().text("query", query.to_string());
        for path in paths {
            form = form
                .file("files", path)
                .map_err(|source| ApiError::UploadFile {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        let builder = self
            .client
            .post(self.endpoint_url(DYNAMIC_EVALUATE_ENDPOINT))
            .bearer_auth(token)
            .multipart(form);
        self.send_json("POST", DYNAMIC_EVALUATE_ENDPOINT, builder, UNKNOWN_ERROR_DETAIL)
    }
}

/// Pulls the server's `detail` message out of an error body.
///
/// Validation failures carry structured details; those are rendered as compact
/// JSON. Bodies that are not JSON, or carry no usable detail, yield `default_detail`.
pub fn extract_error_detail(body: &str, default_detail: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return default_detail.to_string();
    };
    match value.get("detail") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
        Some(Value::String(_)) | Some(Value::Null) | None => default_detail.to_string(),
        Some(other) => other.to_string(),
    }
}
