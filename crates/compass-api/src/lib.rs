//! Blocking HTTP client for the ClauseCompass decision-engine REST API.
mod client;
mod types;

pub use client::{
    extract_error_detail, ApiClient, ApiConfig, DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_MS,
    DOCUMENTS_ENDPOINT, DYNAMIC_EVALUATE_ENDPOINT, LOGIN_ENDPOINT, PERSISTENT_EVALUATE_ENDPOINT,
    REGISTER_ENDPOINT,
};
pub use types::{
    ApiError, DecisionEngineApi, DocumentListResponse, EvaluateRequest, LoginResponse,
    RegisterRequest,
};
