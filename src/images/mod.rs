//! 請求リンクの画像を取得してレポート用に整える
//!
//! 1件の失敗でバッチ全体を止めない。失敗は warn ログを出して None にする。

mod drive;
mod exif;
mod optimize;

pub use drive::DriveStore;
pub use self::exif::read_orientation;
pub use optimize::{optimize_for_report, optimize_image};

use crate::error::{InvoiceError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use invoice_report_common::extract_reference_id;
use rayon::prelude::*;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// ファイルIDから画像のバイト列を取得する
    ///
    /// 権限なし・存在しない場合は `ImageUnavailable`。
    async fn fetch_bytes(&self, id: &str) -> Result<Vec<u8>>;
}

/// 画像を取得できない環境（トークンなしでローカルのブックを使う場合）
pub struct OfflineStore;

#[async_trait]
impl ImageStore for OfflineStore {
    async fn fetch_bytes(&self, id: &str) -> Result<Vec<u8>> {
        Err(InvoiceError::ImageUnavailable {
            id: id.to_string(),
            reason: "no access token configured".to_string(),
        })
    }
}

/// レポートに載せる画像（向き補正・RGB化・縮小済み）
#[derive(Debug, Clone)]
pub struct ReportImage {
    pub id: String,
    pub image: DynamicImage,
}

impl ReportImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// 取得に失敗したら None
pub async fn fetch_image(store: &dyn ImageStore, id: &str) -> Option<Vec<u8>> {
    match store.fetch_bytes(id).await {
        Ok(bytes) if bytes.is_empty() => {
            tracing::warn!("image {} is empty", id);
            None
        }
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}

/// 参照URLの一覧を画像に解決する
///
/// 結果は `refs` と同じ順・同じ件数。取得は最大 `concurrency` 件ずつ並行、
/// デコードと縮小は rayon で並列に行う。
pub async fn resolve_images(
    store: &dyn ImageStore,
    refs: &[String],
    concurrency: usize,
    max_width: u32,
    max_height: u32,
) -> Vec<Option<ReportImage>> {
    let fetched: Vec<Option<(String, Vec<u8>)>> = stream::iter(refs.iter())
        .map(|reference| async move {
            let Some(id) = extract_reference_id(reference) else {
                tracing::warn!("no file id in link '{}'", reference);
                return None;
            };
            let bytes = fetch_image(store, &id).await?;
            Some((id, bytes))
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let count = fetched.len();
    let decoded = tokio::task::spawn_blocking(move || {
        fetched
            .into_par_iter()
            .map(|item| {
                let (id, bytes) = item?;
                let image = optimize_for_report(&bytes, max_width, max_height);
                if image.is_none() {
                    tracing::warn!("image {} is not a readable picture", id);
                }
                image.map(|image| ReportImage { id, image })
            })
            .collect::<Vec<_>>()
    })
    .await;

    match decoded {
        Ok(images) => {
            let available = images.iter().filter(|i| i.is_some()).count();
            tracing::info!("resolved {}/{} images", available, count);
            images
        }
        Err(e) => {
            tracing::warn!("image decoding stopped: {}", e);
            (0..count).map(|_| None).collect()
        }
    }
}
