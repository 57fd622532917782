use axum::{
    Json,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::DermisError;
use crate::middleware::form_fields::FormFields;
use crate::router::DermisState;
use crate::service::vision::{ANALYSIS_NOTICE, data_uri_mime, decode_data_uri, normalize_data_uri};
use crate::types::environment::air_quality_text;
use crate::types::profile::UserDetail;
use crate::types::reply::{AnalysisReply, ReplyStatus};

/// Form fields `image` (data URI), `user_detail` (JSON) and optional `air_quality`.
pub async fn analysis(state: &DermisState, req: Request) -> Result<Response, DermisError> {
    let form = FormFields::from_request(req, state).await?;

    let (Some(image), Some(raw_detail)) = (form.non_empty("image"), form.non_empty("user_detail"))
    else {
        return Err(DermisError::bad_request(
            "Missing required fields: image and user_detail",
        ));
    };
    let user = UserDetail::parse(raw_detail)
        .ok_or_else(|| DermisError::bad_request("Invalid user detail format"))?;

    let image = normalize_data_uri(image);
    let air_quality = air_quality_text(form.get("air_quality"));

    let html = state.vision.analyze(&image, &user, &air_quality).await?;

    let file_url = match state.archive.as_ref() {
        Some(archive) => match decode_data_uri(&image) {
            Ok(bytes) => archive.record(&bytes, data_uri_mime(&image), &user, &html).await,
            Err(e) => {
                warn!(error = %e, "image not archived");
                None
            }
        },
        None => None,
    };

    Ok(Json(AnalysisReply {
        msg: ReplyStatus::Success,
        notice: ANALYSIS_NOTICE.to_string(),
        result: html,
        file_url,
    })
    .into_response())
}
