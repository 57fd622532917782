//! Admin session and flash notices, both carried in encrypted private cookies.

use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::db::DbAdmin;
use crate::error::DermisError;

pub const ADMIN_COOKIE: &str = "admin";
pub const NOTICES_COOKIE: &str = "notices";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub id: i64,
    pub email: String,
    pub fullname: String,
}

impl From<&DbAdmin> for AdminSession {
    fn from(admin: &DbAdmin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            fullname: admin.fullname.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(rename = "type")]
    pub kind: NoticeKind,
    pub msg: String,
}

/// Reads the session cookie; a missing or tampered cookie is `Unauthorized`.
pub fn require_admin(jar: &PrivateCookieJar) -> Result<AdminSession, DermisError> {
    jar.get(ADMIN_COOKIE)
        .and_then(|c| serde_json::from_str(c.value()).ok())
        .ok_or(DermisError::Unauthorized)
}

pub fn start_session(
    jar: PrivateCookieJar,
    session: &AdminSession,
    secure: bool,
) -> Result<PrivateCookieJar, DermisError> {
    let value = serde_json::to_string(session)?;
    Ok(jar.add(build_cookie(ADMIN_COOKIE, value, secure)))
}

pub fn end_session(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(clear_cookie(ADMIN_COOKIE))
}

pub fn push_notice(
    jar: PrivateCookieJar,
    kind: NoticeKind,
    msg: impl Into<String>,
    secure: bool,
) -> PrivateCookieJar {
    let mut notices = read_notices(&jar);
    notices.push(Notice {
        kind,
        msg: msg.into(),
    });
    match serde_json::to_string(&notices) {
        Ok(value) => jar.add(build_cookie(NOTICES_COOKIE, value, secure)),
        Err(_) => jar,
    }
}

/// Returns the pending notices and clears them.
pub fn take_notices(jar: PrivateCookieJar) -> (PrivateCookieJar, Vec<Notice>) {
    let notices = read_notices(&jar);
    (jar.remove(clear_cookie(NOTICES_COOKIE)), notices)
}

fn read_notices(jar: &PrivateCookieJar) -> Vec<Notice> {
    jar.get(NOTICES_COOKIE)
        .and_then(|c| serde_json::from_str(c.value()).ok())
        .unwrap_or_default()
}

fn build_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn clear_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    fn jar() -> PrivateCookieJar {
        PrivateCookieJar::new(Key::generate())
    }

    #[test]
    fn session_roundtrip_and_logout() {
        let session = AdminSession {
            id: 7,
            email: "a@x.io".into(),
            fullname: "A".into(),
        };
        let jar = start_session(jar(), &session, true).unwrap();
        assert_eq!(require_admin(&jar).unwrap(), session);

        let jar = end_session(jar);
        assert!(matches!(require_admin(&jar), Err(DermisError::Unauthorized)));
    }

    #[test]
    fn notices_accumulate_until_taken() {
        let jar = push_notice(jar(), NoticeKind::Error, "first", false);
        let jar = push_notice(jar, NoticeKind::Success, "second", false);
        let (jar, notices) = take_notices(jar);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].kind, NoticeKind::Error);
        assert_eq!(notices[1].msg, "second");
        assert!(take_notices(jar).1.is_empty());
    }
}
