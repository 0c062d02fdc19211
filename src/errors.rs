/// Error types for the InvoiceXpress SDK.
///
/// Every fallible operation in the crate returns [`InvoiceXpressError`]. The
/// variants are distinct so callers can match on the failure they care about;
/// nothing is retried or swallowed internally.
use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::cast::CastError;
use crate::document::{DocumentStatus, DocumentType};

/// The primary error type for the InvoiceXpress SDK.
#[derive(Error, Debug)]
pub enum InvoiceXpressError {
    // Remote
    #[error("Invalid response (HTTP {status}): {message}")]
    InvalidResponse {
        status: u16,
        message: String,
        body: Option<Value>,
        headers: BTreeMap<String, String>,
    },

    #[error("PDF is still being generated, try again later")]
    WaitingPdf,

    // Document engine
    #[error("Invalid document type, valid types are: {}", join_types(.allowed))]
    InvalidDocumentType { allowed: Vec<DocumentType> },

    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    #[error("Invalid status update from '{current}', allowed targets: {}", join_statuses(.allowed))]
    InvalidStatusUpdate {
        current: String,
        allowed: Vec<DocumentStatus>,
    },

    // Request construction
    #[error("Invalid search type '{0}', only code and name are available")]
    InvalidSearchType(String),

    #[error("Missing URL variables [{}] for template {template}", join_names(.missing))]
    MissingUrlVariable {
        missing: Vec<String>,
        template: String,
    },

    #[error("Required object is missing: {0}")]
    ObjectMissing(String),

    // Credentials
    #[error("No credentials attached, construct the API with an Auth before calling remote operations")]
    InvalidAuth,

    #[error("Credentials are not set, both the account name and the API key are required")]
    InvalidCredentials,

    // Data
    #[error("Cast error: {0}")]
    Cast(#[from] CastError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    // Transport
    #[error("HTTP error: {0}")]
    HttpError(String),

    // Generic
    #[error("{0}")]
    Other(String),
}

fn join_types(types: &[DocumentType]) -> String {
    types
        .iter()
        .map(|t| t.plural())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn join_statuses(statuses: &[DocumentStatus]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl InvoiceXpressError {
    /// Returns the HTTP status code if this error came from a remote response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            InvoiceXpressError::InvalidResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the decoded response body of an `InvalidResponse`, if any.
    pub fn body(&self) -> Option<&Value> {
        match self {
            InvoiceXpressError::InvalidResponse { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Field validation errors reported by the service (HTTP 422 bodies).
    pub fn validation_errors(&self) -> Option<&Value> {
        match self {
            InvoiceXpressError::InvalidResponse {
                status: 422, body, ..
            } => body.as_ref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for InvoiceXpressError {
    fn from(err: reqwest::Error) -> Self {
        InvoiceXpressError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for InvoiceXpressError {
    fn from(err: serde_json::Error) -> Self {
        InvoiceXpressError::MalformedPayload(err.to_string())
    }
}

impl From<url::ParseError> for InvoiceXpressError {
    fn from(err: url::ParseError) -> Self {
        InvoiceXpressError::Other(format!("URL parse error: {err}"))
    }
}
