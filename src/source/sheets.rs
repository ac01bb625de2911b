use super::RecordSource;
use crate::config::Config;
use crate::error::{InvoiceError, Result};
use async_trait::async_trait;
use invoice_report_common::{rows_from_grid, CellValue, Row};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

/// Sheets API `values.get` のレスポンス
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

pub struct SheetsSource {
    client: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: String,
}

impl SheetsSource {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate_sheet()?;
        let access_token = config.get_access_token()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| InvoiceError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.sheets_api_base.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            sheet_name: config.sheet_name.clone(),
            access_token,
        })
    }

    fn values_url(&self) -> Result<Url> {
        values_url(&self.api_base, &self.spreadsheet_id, &self.sheet_name)
    }
}

#[async_trait]
impl RecordSource for SheetsSource {
    async fn fetch_all_rows(&self) -> Result<Vec<Row>> {
        let url = self.values_url()?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueRenderOption", "FORMATTED_VALUE")])
            .send()
            .await
            .map_err(|e| InvoiceError::SourceUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body, &self.sheet_name));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| InvoiceError::SourceUnavailable(format!("unreadable response: {}", e)))?;

        let rows = rows_from_values(range.values);
        tracing::info!("fetched {} rows from sheet '{}'", rows.len(), self.sheet_name);
        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("sheet '{}' of spreadsheet {}", self.sheet_name, self.spreadsheet_id)
    }
}

/// `<base>/spreadsheets/<id>/values/'<tab>'`（タブ名はURLエンコードされる）
fn values_url(api_base: &str, spreadsheet_id: &str, sheet_name: &str) -> Result<Url> {
    let mut url = Url::parse(api_base)
        .map_err(|e| InvoiceError::Config(format!("invalid sheets API base '{}': {}", api_base, e)))?;

    // A1表記ではシート名をシングルクォートで囲む
    let range = format!("'{}'", sheet_name.replace('\'', "''"));
    url.path_segments_mut()
        .map_err(|_| InvoiceError::Config(format!("invalid sheets API base '{}'", api_base)))?
        .pop_if_empty()
        .extend(&["spreadsheets", spreadsheet_id, "values", range.as_str()]);
    Ok(url)
}

fn rows_from_values(values: Vec<Vec<serde_json::Value>>) -> Vec<Row> {
    let grid = values
        .into_iter()
        .map(|row| row.into_iter().map(json_to_cell).collect())
        .collect();
    rows_from_grid(grid)
}

fn json_to_cell(value: serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Null => CellValue::Empty,
        serde_json::Value::String(s) if s.is_empty() => CellValue::Empty,
        serde_json::Value::String(s) => CellValue::Text(s),
        serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
        serde_json::Value::Bool(b) => CellValue::Text(b.to_string()),
        other => CellValue::Text(other.to_string()),
    }
}

fn classify_error(status: StatusCode, body: &str, sheet_name: &str) -> InvoiceError {
    let message = match status {
        StatusCode::BAD_REQUEST if body.contains("Unable to parse range") => {
            format!("tab '{}' does not exist", sheet_name)
        }
        StatusCode::UNAUTHORIZED => "access token rejected (401)".to_string(),
        StatusCode::FORBIDDEN => "permission denied (403); is the sheet shared with this account?".to_string(),
        StatusCode::NOT_FOUND => "spreadsheet not found (404)".to_string(),
        other => {
            let snippet: String = body.chars().take(200).collect();
            format!("HTTP {}: {}", other, snippet.trim())
        }
    };
    InvoiceError::SourceUnavailable(message)
}
