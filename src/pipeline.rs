//! 取得 → フィルタ → 画像解決 → PDF生成 の各段階
//!
//! 各段階は前段の結果を値で受け取り、セッション内に可変状態を持たない。
//! どの段階も失敗したらそこからやり直せる。

use crate::config::Config;
use crate::error::{InvoiceError, Result};
use crate::export::{build_report, ReportOutput};
use crate::images::{resolve_images, DriveStore, ImageStore, OfflineStore, ReportImage};
use crate::source::{RecordSource, SheetsSource, WorkbookSource};
use invoice_report_common::{
    columns, filter_approved_unpaid, filter_by_subcontractor, image_references, prepare_display,
    subcontractor_summary, total_sum, ColumnAliases, DisplayRow, Row, SubcontractorSummary,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// `refresh` の結果（承認済み・未払いの行）
#[derive(Debug, Clone)]
pub struct RefreshSummary {
    /// 取得した全行数
    pub fetched: usize,
    pub pending: Vec<Row>,
    /// どのエイリアスも見つからなかった列
    pub missing_columns: Vec<&'static str>,
}

/// 1業者分の選択結果
#[derive(Debug, Clone)]
pub struct Selection {
    pub name: String,
    pub rows: Vec<Row>,
    pub display: Vec<DisplayRow>,
    pub total: f64,
    pub image_refs: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct InvoiceSession {
    config: Config,
    source: Arc<dyn RecordSource>,
    store: Arc<dyn ImageStore>,
}

impl InvoiceSession {
    pub fn new(config: Config, source: Arc<dyn RecordSource>, store: Arc<dyn ImageStore>) -> Self {
        Self { config, source, store }
    }

    /// 設定から取得元と画像ストアを組み立てる
    ///
    /// `workbook` 指定時はローカルファイルを読む。その場合トークンが無くても
    /// 表とPDFは作れる（画像は「なし」になる）。
    pub fn from_config(config: Config, workbook: Option<PathBuf>) -> Result<Self> {
        let source: Arc<dyn RecordSource> = match &workbook {
            Some(path) => Arc::new(WorkbookSource::new(path.clone(), config.sheet_name.clone())),
            None => Arc::new(SheetsSource::new(&config)?),
        };

        let store: Arc<dyn ImageStore> = match DriveStore::new(&config) {
            Ok(store) => Arc::new(store),
            Err(InvoiceError::MissingAccessToken) if workbook.is_some() => {
                tracing::warn!("no access token; invoice images will be skipped");
                Arc::new(OfflineStore)
            }
            Err(e) => return Err(e),
        };

        Ok(Self::new(config, source, store))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source_name(&self) -> String {
        self.source.describe()
    }

    /// 全行を取得し、列名を正規化して承認済み・未払いに絞る
    pub async fn refresh(&self) -> Result<RefreshSummary> {
        let rows = self.source.fetch_all_rows().await?;
        let fetched = rows.len();

        // 設定のエイリアスは既定の後ろに足す
        let mut aliases = ColumnAliases::default();
        aliases.merge(&self.config.columns);
        let (rows, resolved) = aliases.canonicalize(&rows);
        if let Some(source) = resolved.source_of(columns::INVOICE_LINK) {
            tracing::debug!("invoice links read from column '{}'", source);
        }
        for canonical in resolved.missing() {
            tracing::debug!("column '{}' not present in {}", canonical, self.source.describe());
        }

        let pending = filter_approved_unpaid(&rows)?;
        tracing::info!("{} of {} rows are approved and unpaid", pending.len(), fetched);

        Ok(RefreshSummary {
            fetched,
            pending,
            missing_columns: resolved.missing().to_vec(),
        })
    }

    /// 名簿の業者ごとの件数・金額
    pub fn summarize(&self, refreshed: &RefreshSummary) -> Vec<SubcontractorSummary> {
        subcontractor_summary(&refreshed.pending, &self.config.subcontractors)
    }

    pub fn select(&self, refreshed: &RefreshSummary, name: &str) -> Selection {
        let rows = filter_by_subcontractor(&refreshed.pending, name);
        let display = prepare_display(&rows);
        let total = total_sum(&display);
        let image_refs = image_references(&rows);
        tracing::info!("{}: {} invoices, {} links", name, rows.len(), image_refs.len());

        Selection {
            name: name.trim().to_string(),
            rows,
            display,
            total,
            image_refs,
        }
    }

    pub async fn resolve_images(&self, selection: &Selection) -> Vec<Option<ReportImage>> {
        resolve_images(
            self.store.as_ref(),
            &selection.image_refs,
            self.config.image_concurrency,
            self.config.max_image_width,
            self.config.max_image_height,
        )
        .await
    }

    /// `output_dir` 未指定なら設定の出力先
    pub fn generate_report(
        &self,
        selection: &Selection,
        images: &[Option<ReportImage>],
        output_dir: Option<&Path>,
    ) -> Result<ReportOutput> {
        let output_dir = output_dir.unwrap_or(self.config.output_dir.as_path());
        build_report(&selection.display, images, &selection.name, output_dir)
    }
}
