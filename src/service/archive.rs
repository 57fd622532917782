//! Archives each analysis: image to Drive, summary row to a spreadsheet.
//! Nothing here fails the caller; errors are logged.

use chrono::{Local, Utc};
use tracing::{info, warn};
use url::Url;

use crate::api::google_api::{GoogleApi, RESUMABLE_CHUNK};
use crate::config::{DRIVE_UPLOAD_URL, GoogleConfig, SHEETS_BASE_URL};
use crate::error::DermisError;
use crate::google_oauth::{GoogleCredential, GoogleTokenSource};
use crate::types::profile::UserDetail;

/// Files up to this size go up in a single multipart request.
const SIMPLE_UPLOAD_LIMIT: usize = 1024 * 1024;

const SHEET_PROFILE_COLUMNS: [&str; 8] = [
    "fullName", "age", "gender", "address", "city", "state", "country", "skinType",
];

pub fn analysis_file_name() -> String {
    format!("analysis_image_{}.png", Utc::now().timestamp())
}

/// Spreadsheet row: profile columns, file name, timestamp, file URL, analysis.
pub fn sheet_row(
    user: &UserDetail,
    file_name: &str,
    timestamp: &str,
    file_url: Option<&str>,
    analysis: &str,
) -> Vec<String> {
    let mut row: Vec<String> = SHEET_PROFILE_COLUMNS
        .iter()
        .map(|key| user.field_or_empty(key))
        .collect();
    row.push(file_name.to_string());
    row.push(timestamp.to_string());
    row.push(file_url.unwrap_or_default().to_string());
    row.push(analysis.to_string());
    row
}

#[derive(Clone)]
pub struct Archive {
    http: reqwest::Client,
    tokens: GoogleTokenSource,
    folder_id: Option<String>,
    spreadsheet_id: Option<String>,
    sheet_range: String,
    drive_upload_url: Url,
    sheets_base_url: Url,
}

impl Archive {
    /// `None` when no credential file is configured.
    pub fn from_config(cfg: &GoogleConfig, http: reqwest::Client) -> Result<Option<Self>, DermisError> {
        let Some(path) = cfg.credentials_path.as_ref() else {
            return Ok(None);
        };
        let cred = GoogleCredential::load_from_file(path)?;
        info!(path = %path.display(), "Google archive enabled");
        Ok(Some(Self {
            tokens: GoogleTokenSource::new(cred, http.clone()),
            http,
            folder_id: cfg.drive_folder_id.clone(),
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            sheet_range: cfg.sheet_range.clone(),
            drive_upload_url: DRIVE_UPLOAD_URL.clone(),
            sheets_base_url: SHEETS_BASE_URL.clone(),
        }))
    }

    pub fn with_endpoints(mut self, drive_upload_url: Url, sheets_base_url: Url) -> Self {
        self.drive_upload_url = drive_upload_url;
        self.sheets_base_url = sheets_base_url;
        self
    }

    async fn upload(&self, data: &[u8], file_name: &str, mime: &str) -> Result<String, DermisError> {
        let token = self.tokens.access_token().await?;
        let folder = self.folder_id.as_deref();
        let endpoint = &self.drive_upload_url;
        let file = if data.len() <= SIMPLE_UPLOAD_LIMIT {
            GoogleApi::upload_multipart(&self.http, endpoint, &token, file_name, mime, folder, data)
                .await?
        } else {
            GoogleApi::upload_resumable(&self.http, endpoint, &token, file_name, mime, folder, data)
                .await?
        };
        info!(
            file_id = %file.id,
            bytes = data.len(),
            chunks = data.len().div_ceil(RESUMABLE_CHUNK),
            "analysis image uploaded"
        );
        Ok(file.view_url())
    }

    async fn append(&self, row: Vec<String>) -> Result<(), DermisError> {
        let Some(sheet) = self.spreadsheet_id.as_deref() else {
            return Ok(());
        };
        let token = self.tokens.access_token().await?;
        let reply = GoogleApi::append_row(
            &self.http,
            &self.sheets_base_url,
            &token,
            sheet,
            &self.sheet_range,
            &row,
        )
        .await?;
        let range = reply.updates.and_then(|u| u.updated_range).unwrap_or_default();
        info!(range = %range, "analysis row appended");
        Ok(())
    }

    /// Uploads the image and schedules the sheet row. Returns the Drive link
    /// when the upload succeeded.
    pub async fn record(
        &self,
        image_bytes: &[u8],
        mime: &str,
        user: &UserDetail,
        analysis: &str,
    ) -> Option<String> {
        let file_name = analysis_file_name();
        let file_url = match self.upload(image_bytes, &file_name, mime).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, file = %file_name, "Drive upload failed");
                None
            }
        };

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let row = sheet_row(user, &file_name, &timestamp, file_url.as_deref(), analysis);
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.append(row).await {
                warn!(error = %e, "sheet append failed");
            }
        });

        file_url
    }
}
