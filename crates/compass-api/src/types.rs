use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Account registration payload accepted by `POST /register`.
pub struct RegisterRequest {
    pub userid: String,
    pub emailid: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Token issued by `POST /login`.
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
/// Document names held by the server's persistent knowledge base.
pub struct DocumentListResponse {
    #[serde(default)]
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Query against the persistent knowledge base, optionally scoped to server-side files.
pub struct EvaluateRequest {
    pub query_text: String,
    pub source_files: Vec<String>,
}

#[derive(Debug, Error)]
/// Enumerates failures surfaced by the decision-engine client.
pub enum ApiError {
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("connection error to API at {api_base}: {source}")]
    Connection {
        api_base: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{status} - {detail}")]
    HttpStatus { status: u16, detail: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("failed to read upload file {}: {source}", path.display())]
    UploadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Trait contract for the decision-engine endpoints the client drives.
pub trait DecisionEngineApi {
    fn api_base(&self) -> &str;

    fn register(&self, request: &RegisterRequest) -> Result<(), ApiError>;

    fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    fn list_documents(&self, token: &str) -> Result<Vec<String>, ApiError>;

    fn evaluate(&self, token: &str, request: &EvaluateRequest) -> Result<Value, ApiError>;

    fn evaluate_with_documents(
        &self,
        token: &str,
        query: &str,
        paths: &[&Path],
    ) -> Result<Value, ApiError>;
}
