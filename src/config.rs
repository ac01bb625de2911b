use crate::error::{InvoiceError, Result};
use invoice_report_common::layout::{IMAGE_MAX_HEIGHT_PX, IMAGE_MAX_WIDTH_PX};
use invoice_report_common::ColumnAliases;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_ACCESS_TOKEN";

/// 起動時に1回だけ読み込み、以降は変更しない設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub access_token: Option<String>,
    pub subcontractors: Vec<String>,
    pub output_dir: PathBuf,
    pub sheets_api_base: String,
    pub drive_api_base: String,
    pub image_concurrency: usize,
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub timeout_seconds: u64,
    pub columns: ColumnAliases,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| InvoiceError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("invoice-report").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: "Estimates/Inovices Status".into(),
            access_token: None,
            subcontractors: [
                "pelico", "htin", "frank", "harold", "marco", "gustavo",
                "antonio", "nahun", "edgar", "24/7 tech", "josue cruz",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            output_dir: PathBuf::from("pdfs"),
            sheets_api_base: "https://sheets.googleapis.com/v4".into(),
            drive_api_base: "https://www.googleapis.com/drive/v3".into(),
            image_concurrency: 4,
            max_image_width: IMAGE_MAX_WIDTH_PX,
            max_image_height: IMAGE_MAX_HEIGHT_PX,
            timeout_seconds: 60,
            columns: ColumnAliases::default(),
        }
    }

    pub fn get_access_token(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Ok(token.trim().to_string());
            }
        }

        self.access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(InvoiceError::MissingAccessToken)
    }

    /// Sheets 取得に必要な項目の確認
    pub fn validate_sheet(&self) -> Result<()> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(InvoiceError::Config(
                "spreadsheet id is not set; run `invoice-report config --set-spreadsheet-id <ID>`".into(),
            ));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(InvoiceError::Config("sheet name is empty".into()));
        }
        Ok(())
    }

    pub fn set_spreadsheet_id(&mut self, id: String) -> Result<()> {
        self.spreadsheet_id = id;
        self.save()
    }

    pub fn set_sheet_name(&mut self, name: String) -> Result<()> {
        self.sheet_name = name;
        self.save()
    }

    pub fn set_output_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.output_dir = dir;
        self.save()
    }

    pub fn set_access_token(&mut self, token: String) -> Result<()> {
        self.access_token = Some(token);
        self.save()
    }

    /// 名簿に追加（大文字小文字を無視して重複は追加しない）
    pub fn add_subcontractor(&mut self, name: String) -> Result<bool> {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() || self.subcontractors.iter().any(|s| s.to_lowercase() == normalized) {
            return Ok(false);
        }
        self.subcontractors.push(normalized);
        self.save()?;
        Ok(true)
    }
}
