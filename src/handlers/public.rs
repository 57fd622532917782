use axum::{
    Json,
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::error::DermisError;
use crate::handlers::analysis::analysis;
use crate::middleware::form_fields::read_json;
use crate::middleware::route_type::{PublicRoute, RouteType};
use crate::router::DermisState;
use crate::service::mailer::FEEDBACK_SENT_NOTICE;
use crate::types::environment::Coordinates;
use crate::types::profile::{FeedbackForm, PersonalizationData};
use crate::types::reply::{ApiReply, MagicReply, ReplyStatus};

/// GET|POST /route.php?type=<base64>
pub async fn public_route(
    State(state): State<DermisState>,
    RouteType(route): RouteType<PublicRoute>,
    req: Request,
) -> Result<Response, DermisError> {
    match route {
        PublicRoute::Analysis => analysis(&state, req).await,
        PublicRoute::Feedback => feedback(&state, req).await,
        PublicRoute::PersonalizeMagic => personalize_magic(&state, req).await,
        PublicRoute::Environment => environment(&state, req).await,
    }
}

async fn feedback(state: &DermisState, req: Request) -> Result<Response, DermisError> {
    if req.method() != Method::POST {
        return Err(DermisError::UnknownRoute);
    }
    let form: FeedbackForm = read_json(req, state, "Invalid JSON data").await?;
    let reply_to = form.validate()?;

    state.mailer.send_feedback(reply_to, &form.suggestion).await?;
    Ok(Json(ApiReply::done(FEEDBACK_SENT_NOTICE)).into_response())
}

async fn personalize_magic(state: &DermisState, req: Request) -> Result<Response, DermisError> {
    if req.method() != Method::POST {
        return Err(DermisError::UnknownRoute);
    }
    let data: PersonalizationData = read_json(req, state, "Invalid request body").await?;
    let outcome = state.personalizer.personalize(&data).await?;
    let notice = outcome.notice();
    let text = outcome.into_text();

    info!(city = %data.environment_data.city, chars = text.len(), notice, "magic section ready");
    Ok(Json(MagicReply {
        msg: ReplyStatus::Success,
        notice: notice.to_string(),
        result: text.clone(),
        personalized_text: text,
    })
    .into_response())
}

async fn environment(state: &DermisState, req: Request) -> Result<Response, DermisError> {
    let at: Coordinates = read_json(req, state, "Invalid coordinates").await?;
    let report = state.environment.lookup(at).await?;
    Ok(Json(ApiReply::success("Environment data fetched successfully", report)).into_response())
}
