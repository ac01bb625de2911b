use super::ImageStore;
use crate::config::Config;
use crate::error::{InvoiceError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Google Drive v3 からファイル本体を取得する
pub struct DriveStore {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl DriveStore {
    pub fn new(config: &Config) -> Result<Self> {
        let access_token = config.get_access_token()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| InvoiceError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.drive_api_base.trim_end_matches('/').to_string(),
            access_token,
        })
    }
}

#[async_trait]
impl ImageStore for DriveStore {
    async fn fetch_bytes(&self, id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/files/{}", self.api_base, id);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(|e| unavailable(id, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(id, status_reason(status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| unavailable(id, format!("download interrupted: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

fn unavailable(id: &str, reason: String) -> InvoiceError {
    InvoiceError::ImageUnavailable {
        id: id.to_string(),
        reason,
    }
}

fn status_reason(status: StatusCode) -> String {
    match status {
        StatusCode::FORBIDDEN => "permission denied (403)".to_string(),
        StatusCode::NOT_FOUND => "file not found (404)".to_string(),
        StatusCode::UNAUTHORIZED => "access token rejected (401)".to_string(),
        other => format!("HTTP {}", other),
    }
}
