use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{StatusCode, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::error::DermisError;

/// Text fields of a `multipart/form-data` or urlencoded body.
#[derive(Debug, Default, Clone)]
pub struct FormFields(pub HashMap<String, String>);

impl FormFields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Trimmed value; empty counts as absent.
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }
}

fn limit_or_bad_request(status: StatusCode, text: String) -> DermisError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        DermisError::PayloadTooLarge
    } else {
        DermisError::BadRequest(text)
    }
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = DermisError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        let mut fields = HashMap::new();
        if is_multipart {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|r| limit_or_bad_request(r.status(), r.body_text()))?;
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| limit_or_bad_request(e.status(), e.body_text()))?
            {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                let value = field
                    .text()
                    .await
                    .map_err(|e| limit_or_bad_request(e.status(), e.body_text()))?;
                fields.insert(name, value);
            }
        } else {
            let body = read_body(req, state).await?;
            fields.extend(
                url::form_urlencoded::parse(&body).map(|(k, v)| (k.into_owned(), v.into_owned())),
            );
        }
        Ok(Self(fields))
    }
}

/// Raw body bytes; the configured body limit surfaces as 413.
pub async fn read_body<S>(req: Request, state: &S) -> Result<Bytes, DermisError>
where
    S: Send + Sync,
{
    Bytes::from_request(req, state)
        .await
        .map_err(|r| limit_or_bad_request(r.status(), r.body_text()))
}

/// JSON body with a fixed notice for anything unparsable.
pub async fn read_json<T, S>(req: Request, state: &S, notice: &str) -> Result<T, DermisError>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    let body = read_body(req, state).await?;
    serde_json::from_slice(&body).map_err(|_| DermisError::bad_request(notice))
}
