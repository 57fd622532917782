//! `?type=<base64>` dispatch for the legacy `route.php` / `adminRoute.php` endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use std::str::FromStr;

use crate::error::DermisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicRoute {
    Analysis,
    Feedback,
    PersonalizeMagic,
    Environment,
}

impl FromStr for PublicRoute {
    type Err = DermisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analysis" => Ok(Self::Analysis),
            "feedback" => Ok(Self::Feedback),
            "personalize-magic" => Ok(Self::PersonalizeMagic),
            "environment" => Ok(Self::Environment),
            _ => Err(DermisError::UnknownRoute),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRoute {
    Login,
    Logout,
    VisionPrompt,
    SearchPrompt,
    EditProfile,
    ChangePassword,
    Prompts,
    Notices,
}

impl FromStr for AdminRoute {
    type Err = DermisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "logout" => Ok(Self::Logout),
            "vision-prompt" => Ok(Self::VisionPrompt),
            "search-prompt" => Ok(Self::SearchPrompt),
            "edit_profile" => Ok(Self::EditProfile),
            "change_password" => Ok(Self::ChangePassword),
            "prompts" => Ok(Self::Prompts),
            "notices" => Ok(Self::Notices),
            _ => Err(DermisError::UnknownRoute),
        }
    }
}

/// Decoded value of the `type` query parameter, if present and valid base64 text.
pub fn decode_type(query: Option<&str>) -> Option<String> {
    let raw = url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == "type")
        .map(|(_, v)| v.into_owned())?;
    // an unescaped `+` arrives as a space after form decoding
    let raw = raw.trim().replace(' ', "+");
    let bytes = STANDARD
        .decode(&raw)
        .or_else(|_| STANDARD_NO_PAD.decode(raw.trim_end_matches('=')))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Extracts the route selected by `?type=`; unknown or malformed values reject
/// with [`DermisError::UnknownRoute`].
#[derive(Debug, Clone, Copy)]
pub struct RouteType<T>(pub T);

impl<S, T> FromRequestParts<S> for RouteType<T>
where
    S: Send + Sync,
    T: FromStr<Err = DermisError>,
{
    type Rejection = DermisError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let name = decode_type(parts.uri.query()).ok_or(DermisError::UnknownRoute)?;
        Ok(Self(name.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(name: &str) -> String {
        format!("type={}", STANDARD.encode(name))
    }

    #[test]
    fn decodes_known_routes() {
        let q = encoded("analysis");
        assert_eq!(decode_type(Some(&q)).as_deref(), Some("analysis"));
        assert_eq!(
            decode_type(Some(&q)).unwrap().parse::<PublicRoute>().unwrap(),
            PublicRoute::Analysis
        );
        let q = encoded("change_password");
        assert_eq!(
            decode_type(Some(&q)).unwrap().parse::<AdminRoute>().unwrap(),
            AdminRoute::ChangePassword
        );
    }

    #[test]
    fn tolerates_missing_padding_and_other_params() {
        // "login" encodes as bG9naW4=
        assert_eq!(
            decode_type(Some("x=1&type=bG9naW4")).as_deref(),
            Some("login")
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_type(None).is_none());
        assert!(decode_type(Some("kind=YW5hbHlzaXM=")).is_none());
        assert!(decode_type(Some("type=%%%")).is_none());
        assert!("login".parse::<PublicRoute>().is_err());
        assert!("analysis".parse::<AdminRoute>().is_err());
    }
}
