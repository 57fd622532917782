use crate::error::DermisError;
use crate::types::environment::{AirQualityLookup, Coordinates, WeatherLookup};
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LOCATION};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

/// Resumable chunks must be a multiple of 256 KiB.
pub const RESUMABLE_CHUNK: usize = 2 * 1024 * 1024;
const BOUNDARY: &str = "dermis_drive_upload_boundary";

#[derive(Debug, Clone, Deserialize)]
pub struct DriveFile {
    pub id: String,
}

impl DriveFile {
    pub fn view_url(&self) -> String {
        format!("https://drive.google.com/file/d/{}/view", self.id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendReply {
    #[serde(default)]
    pub updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendUpdates {
    #[serde(default)]
    pub updated_range: Option<String>,
}

/// Stateless Google Workspace and Maps Platform endpoints.
pub struct GoogleApi;

impl GoogleApi {
    /// Single-request `multipart/related` upload for small files.
    pub async fn upload_multipart(
        client: &reqwest::Client,
        endpoint: &Url,
        token: &str,
        name: &str,
        mime: &str,
        folder_id: Option<&str>,
        data: &[u8],
    ) -> Result<DriveFile, DermisError> {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("supportsAllDrives", "true");

        let body = multipart_related_body(&file_metadata(name, folder_id), mime, data);
        let resp = client
            .post(url)
            .bearer_auth(token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await?;
        ensure_success("Drive upload", &resp)?;
        Ok(resp.json().await?)
    }

    /// Resumable upload sent in [`RESUMABLE_CHUNK`]-sized pieces.
    pub async fn upload_resumable(
        client: &reqwest::Client,
        endpoint: &Url,
        token: &str,
        name: &str,
        mime: &str,
        folder_id: Option<&str>,
        data: &[u8],
    ) -> Result<DriveFile, DermisError> {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("uploadType", "resumable")
            .append_pair("supportsAllDrives", "true");

        let start = client
            .post(url)
            .bearer_auth(token)
            .header("X-Upload-Content-Type", mime)
            .header("X-Upload-Content-Length", data.len())
            .json(&file_metadata(name, folder_id))
            .send()
            .await?;
        ensure_success("Drive resumable session", &start)?;
        let session = start
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| DermisError::Google("resumable session without Location".into()))?
            .to_string();

        let total = data.len();
        for (index, chunk) in data.chunks(RESUMABLE_CHUNK).enumerate() {
            let first = index * RESUMABLE_CHUNK;
            let last = first + chunk.len() - 1;
            let resp = client
                .put(&session)
                .bearer_auth(token)
                .header(CONTENT_LENGTH, chunk.len())
                .header(CONTENT_RANGE, format!("bytes {first}-{last}/{total}"))
                .body(chunk.to_vec())
                .send()
                .await?;

            // 308 Resume Incomplete until the final chunk lands
            if resp.status().as_u16() == 308 {
                debug!(uploaded = last + 1, total, "Drive chunk accepted");
                continue;
            }
            ensure_success("Drive chunk upload", &resp)?;
            return Ok(resp.json().await?);
        }

        Err(DermisError::Google("Upload failed to finalize".into()))
    }

    /// `endpoint` is the spreadsheets collection URL and must end in `/`.
    pub async fn append_row(
        client: &reqwest::Client,
        endpoint: &Url,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        row: &[String],
    ) -> Result<AppendReply, DermisError> {
        let mut url = endpoint.join(&format!("{spreadsheet_id}/values/{range}:append"))?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let resp = client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": [row] }))
            .send()
            .await?;
        ensure_success("Sheets append", &resp)?;
        Ok(resp.json().await?)
    }

    pub async fn lookup_air_quality(
        client: &reqwest::Client,
        endpoint: &Url,
        api_key: &str,
        at: Coordinates,
    ) -> Result<AirQualityLookup, DermisError> {
        let mut url = endpoint.clone();
        url.query_pairs_mut().append_pair("key", api_key);

        let resp = client
            .post(url)
            .json(&json!({
                "universalAqi": true,
                "location": { "latitude": at.lat, "longitude": at.lng },
                "extraComputations": [
                    "DOMINANT_POLLUTANT_CONCENTRATION",
                    "POLLUTANT_CONCENTRATION",
                    "LOCAL_AQI"
                ]
            }))
            .send()
            .await?;
        ensure_success("Air quality lookup", &resp)?;
        Ok(resp.json().await?)
    }

    pub async fn lookup_weather(
        client: &reqwest::Client,
        endpoint: &Url,
        api_key: &str,
        at: Coordinates,
    ) -> Result<WeatherLookup, DermisError> {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", api_key)
            .append_pair("location.latitude", &at.lat.to_string())
            .append_pair("location.longitude", &at.lng.to_string());

        let resp = client.get(url).send().await?;
        ensure_success("Weather lookup", &resp)?;
        Ok(resp.json().await?)
    }
}

fn ensure_success(what: &str, resp: &reqwest::Response) -> Result<(), DermisError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    Err(DermisError::Google(format!("{what} returned HTTP {status}")))
}

fn file_metadata(name: &str, folder_id: Option<&str>) -> serde_json::Value {
    match folder_id {
        Some(folder) => json!({ "name": name, "parents": [folder] }),
        None => json!({ "name": name }),
    }
}

fn multipart_related_body(metadata: &serde_json::Value, mime: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{BOUNDARY}\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}
