use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

use crate::types::reply::ApiReply;

#[derive(Debug, ThisError)]
pub enum DermisError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Invalid request type")]
    UnknownRoute,

    #[error("{0}")]
    BadRequest(String),

    #[error("Login required")]
    Unauthorized,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Failed to fetch prompt: {0}")]
    PromptFetch(String),

    #[error("{0} prompt not found")]
    PromptMissing(&'static str),

    #[error("API returned HTTP {}", .0.as_u16())]
    UpstreamStatus(StatusCode),

    #[error("API Error: {0}")]
    OpenAi(String),

    #[error("JSON Decode Error: {0}")]
    UpstreamDecode(String),

    #[error("No text content found in API response")]
    EmptyCompletion,

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Google API error: {0}")]
    Google(String),

    #[error("OAuth2 token request error: {0}")]
    Oauth2Token(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl DermisError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            DermisError::BadRequest(_) | DermisError::Json(_) | DermisError::Base64(_) => {
                StatusCode::BAD_REQUEST
            }
            DermisError::UnknownRoute => StatusCode::NOT_FOUND,
            DermisError::Unauthorized => StatusCode::UNAUTHORIZED,
            DermisError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            DermisError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            DermisError::UpstreamStatus(code) if *code == StatusCode::TOO_MANY_REQUESTS => *code,
            DermisError::UpstreamStatus(_)
            | DermisError::OpenAi(_)
            | DermisError::UpstreamDecode(_)
            | DermisError::EmptyCompletion
            | DermisError::Reqwest(_)
            | DermisError::Google(_)
            | DermisError::Oauth2Token(_) => StatusCode::BAD_GATEWAY,
            DermisError::PromptFetch(_)
            | DermisError::PromptMissing(_)
            | DermisError::Mail(_)
            | DermisError::Database(_)
            | DermisError::Io(_)
            | DermisError::UrlParse(_)
            | DermisError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Storage and local failures are not echoed.
    fn notice(&self) -> String {
        match self {
            DermisError::Database(_)
            | DermisError::Io(_)
            | DermisError::UrlParse(_)
            | DermisError::PasswordHash(_) => "An internal server error occurred.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Errors worth another attempt against an upstream API.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for DermisError {
    fn is_retryable(&self) -> bool {
        match self {
            DermisError::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            DermisError::UpstreamStatus(code) => code.is_server_error(),
            _ => false,
        }
    }
}

impl
    From<
        RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    > for DermisError
{
    fn from(
        e: RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    ) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => {
                DermisError::Oauth2Token(format!("server rejected refresh: {}", err.error()))
            }
            RequestTokenError::Request(HttpClientError::Reqwest(req_e)) => {
                DermisError::Reqwest(*req_e)
            }
            RequestTokenError::Request(req_e) => {
                DermisError::Oauth2Token(format!("request failed: {}", req_e))
            }
            RequestTokenError::Parse(parse_err, _body) => DermisError::Json(parse_err.into_inner()),
            RequestTokenError::Other(s) => DermisError::Oauth2Token(s),
        }
    }
}

impl From<lettre::error::Error> for DermisError {
    fn from(e: lettre::error::Error) -> Self {
        DermisError::Mail(e.to_string())
    }
}

impl From<lettre::address::AddressError> for DermisError {
    fn from(e: lettre::address::AddressError) -> Self {
        DermisError::Mail(format!("invalid address: {e}"))
    }
}

impl IntoResponse for DermisError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self, "request failed");
        }
        (status, Json(ApiReply::error(self.notice()))).into_response()
    }
}
