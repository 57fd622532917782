use axum::{
    Json,
    extract::{FromRequest, Request, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::{SEARCH_PROMPT_MODEL, VISION_PROMPT_MODEL};
use crate::error::DermisError;
use crate::middleware::auth::{
    AdminSession, NoticeKind, end_session, push_notice, require_admin, start_session, take_notices,
};
use crate::middleware::form_fields::FormFields;
use crate::middleware::route_type::{AdminRoute, RouteType};
use crate::router::DermisState;
use crate::service::passwords::{check_new_password, hash_password, verify_password};
use crate::types::reply::ApiReply;

const LOGIN_FAILED_NOTICE: &str = "Please check Username or Password";
const PROMPT_SET_NOTICE: &str = "Prompt set successfully.";
const PROFILE_UPDATED_NOTICE: &str = "Your profile update successfully.";
const PASSWORD_UPDATED_NOTICE: &str = "Your password update successfully.";

/// GET|POST /adminRoute.php?type=<base64>
pub async fn admin_route(
    State(state): State<DermisState>,
    jar: PrivateCookieJar,
    RouteType(route): RouteType<AdminRoute>,
    req: Request,
) -> Result<Response, DermisError> {
    match route {
        AdminRoute::Login => login(&state, jar, req).await,
        AdminRoute::Logout => Ok(logout(&state, jar)),
        AdminRoute::VisionPrompt => set_prompt(&state, &jar, req, VISION_PROMPT_MODEL).await,
        AdminRoute::SearchPrompt => set_prompt(&state, &jar, req, SEARCH_PROMPT_MODEL).await,
        AdminRoute::EditProfile => edit_profile(&state, jar, req).await,
        AdminRoute::ChangePassword => change_password(&state, jar, req).await,
        AdminRoute::Prompts => list_prompts(&state, &jar).await,
        AdminRoute::Notices => Ok(notices(jar)),
    }
}

async fn login(state: &DermisState, jar: PrivateCookieJar, req: Request) -> Result<Response, DermisError> {
    let form = FormFields::from_request(req, state).await?;
    let secure = state.secure_cookies();

    let admin = match (form.non_empty("email"), form.get("password").filter(|p| !p.is_empty())) {
        (Some(email), Some(password)) => state
            .storage
            .find_admin_by_email(email)
            .await?
            .filter(|admin| verify_password(password, &admin.password_hash)),
        _ => None,
    };

    let Some(admin) = admin else {
        warn!(email = form.get("email").unwrap_or_default(), "admin login rejected");
        let jar = push_notice(jar, NoticeKind::Error, LOGIN_FAILED_NOTICE, secure);
        return Ok((jar, Redirect::to(&state.cfg.admin_url("login"))).into_response());
    };

    info!(admin_id = admin.id, "admin logged in");
    let jar = start_session(jar, &AdminSession::from(&admin), secure)?;
    Ok((jar, Redirect::to(&state.cfg.admin_url(""))).into_response())
}

fn logout(state: &DermisState, jar: PrivateCookieJar) -> Response {
    (end_session(jar), Redirect::to(&state.cfg.admin_url("login"))).into_response()
}

async fn set_prompt(
    state: &DermisState,
    jar: &PrivateCookieJar,
    req: Request,
    model: &'static str,
) -> Result<Response, DermisError> {
    let session = require_admin(jar)?;
    let form = FormFields::from_request(req, state).await?;
    let prompt = form
        .non_empty("prompt")
        .ok_or_else(|| DermisError::bad_request("Prompt cannot be empty"))?;

    state.prompts.set(model, prompt).await?;
    info!(admin_id = session.id, model, "prompt saved by admin");
    Ok(Json(ApiReply::success(PROMPT_SET_NOTICE, String::new())).into_response())
}

/// Validation failures become an error notice; anything else propagates.
fn flash_outcome(
    jar: PrivateCookieJar,
    outcome: Result<&'static str, DermisError>,
    secure: bool,
) -> Result<PrivateCookieJar, DermisError> {
    match outcome {
        Ok(msg) => Ok(push_notice(jar, NoticeKind::Success, msg, secure)),
        Err(DermisError::BadRequest(msg)) => Ok(push_notice(jar, NoticeKind::Error, msg, secure)),
        Err(e) => Err(e),
    }
}

async fn edit_profile(state: &DermisState, jar: PrivateCookieJar, req: Request) -> Result<Response, DermisError> {
    let mut session = require_admin(&jar)?;
    let form = FormFields::from_request(req, state).await?;
    let secure = state.secure_cookies();

    let outcome = async {
        let fullname = form
            .non_empty("fullname")
            .ok_or_else(|| DermisError::bad_request("Full name is required"))?;
        let email = form
            .non_empty("email")
            .filter(|e| e.parse::<lettre::Address>().is_ok())
            .ok_or_else(|| DermisError::bad_request("Please enter a valid email address"))?;
        state
            .storage
            .update_admin_profile(session.id, fullname, email)
            .await?;
        session.fullname = fullname.to_string();
        session.email = email.to_string();
        Ok::<_, DermisError>(PROFILE_UPDATED_NOTICE)
    }
    .await;

    let jar = start_session(jar, &session, secure)?;
    let jar = flash_outcome(jar, outcome, secure)?;
    Ok((jar, Redirect::to(&state.cfg.admin_url("account-setting"))).into_response())
}

async fn change_password(state: &DermisState, jar: PrivateCookieJar, req: Request) -> Result<Response, DermisError> {
    let session = require_admin(&jar)?;
    let form = FormFields::from_request(req, state).await?;

    let outcome = async {
        let password = form.get("password").unwrap_or_default();
        check_new_password(password, form.get("confirm_password").unwrap_or_default())?;
        let hash = hash_password(password)?;
        state.storage.update_admin_password(session.id, &hash).await?;
        info!(admin_id = session.id, "admin password changed");
        Ok::<_, DermisError>(PASSWORD_UPDATED_NOTICE)
    }
    .await;

    let jar = flash_outcome(jar, outcome, state.secure_cookies())?;
    Ok((jar, Redirect::to(&state.cfg.admin_url("account-setting"))).into_response())
}

async fn list_prompts(state: &DermisState, jar: &PrivateCookieJar) -> Result<Response, DermisError> {
    require_admin(jar)?;
    let prompts: BTreeMap<String, String> = state
        .prompts
        .get_all()
        .await?
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(Json(ApiReply::success("Instruction fetch successfully.", prompts)).into_response())
}

fn notices(jar: PrivateCookieJar) -> Response {
    let (jar, notices) = take_notices(jar);
    (jar, Json(ApiReply::success("Notices fetched successfully.", notices))).into_response()
}

/// Seeds the configured admin account when no row has its email yet.
pub async fn bootstrap_admin(state: &DermisState) -> Result<(), DermisError> {
    let Some(seed) = state.cfg.bootstrap_admin.as_ref() else {
        return Ok(());
    };
    if state.storage.find_admin_by_email(&seed.email).await?.is_some() {
        return Ok(());
    }
    let hash = hash_password(&seed.password)?;
    let id = state
        .storage
        .insert_admin(&seed.email, &hash, &seed.fullname)
        .await?;
    info!(admin_id = id, email = %seed.email, "bootstrap admin created");
    Ok(())
}
