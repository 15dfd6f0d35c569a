#[cfg(feature = "server")]
use actix_web::{HttpResponse, ResponseError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
#[cfg(feature = "server")]
use utoipa::ToSchema;

/// Why a generation backend could not produce a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendFailure {
    /// The backend could not be reached or refused our credentials.
    Unavailable(String),
    /// The backend was reached but generation failed.
    Error(String),
}

impl BackendFailure {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        BackendFailure::Unavailable(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        BackendFailure::Error(msg.into())
    }

    /// The failure text without the category prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            BackendFailure::Unavailable(msg) | BackendFailure::Error(msg) => msg,
        }
    }

    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, BackendFailure::Unavailable(_))
    }
}

impl fmt::Display for BackendFailure {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            BackendFailure::Unavailable(msg) => write!(f, "Backend unavailable: {}", msg),
            BackendFailure::Error(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for BackendFailure {}

static UNAVAILABLE_PATTERN: OnceLock<Regex> = OnceLock::new();

impl BackendFailure {
    /// Sorts a provider error message into a failure category.
    ///
    /// Credential and transport problems are `Unavailable`; anything else the
    /// provider reports is an `Error`.
    #[must_use]
    pub fn from_provider_message(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let pattern = UNAVAILABLE_PATTERN.get_or_init(|| {
            Regex::new(
                r"(?i)(authentication|api[ _]?key|unauthori[sz]ed|forbidden|noauth|\b40[13]\b|connection refused|failed to connect|error sending request|dns error|timed out|timeout)",
            )
            .unwrap()
        });

        if pattern.is_match(&msg) {
            BackendFailure::Unavailable(msg)
        } else {
            BackendFailure::Error(msg)
        }
    }
}

// Conversion from genai::Error to BackendFailure
impl From<genai::Error> for BackendFailure {
    fn from(err: genai::Error) -> Self {
        BackendFailure::from_provider_message(err.to_string())
    }
}

// Conversion from reqwest::Error to BackendFailure
impl From<reqwest::Error> for BackendFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            BackendFailure::Unavailable(err.to_string())
        } else {
            BackendFailure::Error(err.to_string())
        }
    }
}

/// Invalid process configuration, reported once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: String, value: String, reason: String },
    Backend(String),
}

impl fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "Invalid value '{}' for {}: {}", value, key, reason)
            }
            ConfigError::Backend(msg) => write!(f, "Failed to build backend: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Error body of the legacy `/generate` endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct DetailResponse {
    pub detail: String,
}

#[cfg(feature = "server")]
#[derive(Debug)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    /// Raw backend failure surfaced as HTTP 500 `{detail}`.
    LegacyDetail(String),
}

#[cfg(feature = "server")]
impl fmt::Display for ApiError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ApiError::InternalServerError(msg) => write!(f, "Internal server error: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::LegacyDetail(msg) => write!(f, "{}", msg),
        }
    }
}

#[cfg(feature = "server")]
impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalServerError(_) | ApiError::LegacyDetail(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_type, message) = match self {
            ApiError::LegacyDetail(detail) => {
                return HttpResponse::build(self.status_code()).json(DetailResponse { detail: detail.clone() });
            }
            ApiError::InternalServerError(msg) => ("INTERNAL_ERROR", msg.clone()),
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg.clone()),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            status_code: self.status_code().as_u16(),
        };

        HttpResponse::build(self.status_code()).json(error_response)
    }
}

#[cfg(feature = "server")]
impl From<BackendFailure> for ApiError {
    fn from(err: BackendFailure) -> Self {
        ApiError::LegacyDetail(err.detail().to_string())
    }
}

// Helper functions for creating specific error types
#[cfg(feature = "server")]
impl ApiError {
    pub fn internal_server_error(msg: impl Into<String>) -> Self {
        ApiError::InternalServerError(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }
}
