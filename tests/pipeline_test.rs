//! 取得からPDF生成までの統合テスト（取得元・画像ストアはテスト用の実装）

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use invoice_report::config::Config;
use invoice_report::error::{InvoiceError, Result};
use invoice_report::images::ImageStore;
use invoice_report::pipeline::InvoiceSession;
use invoice_report::source::RecordSource;
use invoice_report::worker::{spawn_report_job, JobEvent, JobStep, ReportRequest};
use invoice_report_common::{CellValue, Row};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

struct FakeSource {
    rows: Vec<Row>,
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn fetch_all_rows(&self) -> Result<Vec<Row>> {
        Ok(self.rows.clone())
    }

    fn describe(&self) -> String {
        "fake sheet".to_string()
    }
}

struct BrokenSource;

#[async_trait]
impl RecordSource for BrokenSource {
    async fn fetch_all_rows(&self) -> Result<Vec<Row>> {
        Err(InvoiceError::SourceUnavailable("tab 'Nope' does not exist".to_string()))
    }

    fn describe(&self) -> String {
        "broken sheet".to_string()
    }
}

/// `release` が届くまで取得を止める。破棄されたら `dropped` に通知する
struct GatedSource {
    rows: Vec<Row>,
    release: Mutex<mpsc::Receiver<()>>,
    dropped: mpsc::Sender<()>,
}

#[async_trait]
impl RecordSource for GatedSource {
    async fn fetch_all_rows(&self) -> Result<Vec<Row>> {
        {
            let release = self.release.lock().unwrap();
            let _ = release.recv_timeout(Duration::from_secs(30));
        }
        Ok(self.rows.clone())
    }

    fn describe(&self) -> String {
        "gated sheet".to_string()
    }
}

impl Drop for GatedSource {
    fn drop(&mut self) {
        let _ = self.dropped.send(());
    }
}

struct FakeStore {
    files: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl ImageStore for FakeStore {
    async fn fetch_bytes(&self, id: &str) -> Result<Vec<u8>> {
        self.files.get(id).cloned().ok_or_else(|| InvoiceError::ImageUnavailable {
            id: id.to_string(),
            reason: "permission denied (403)".to_string(),
        })
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn invoice(name: &str, approval: &str, status: &str, timestamp: &str, total: &str, link: &str) -> Row {
    Row::new()
        .with("Name", name)
        .with("Approval Status", approval)
        .with("Invoice Status", status)
        .with("Invoice Timestamp", timestamp)
        .with("Location", "1200 First St NE, Washington, District of Columbia 20002, United States")
        .with("Invoice #", "5001")
        .with("WO #", "WO-1")
        .with("Total", total)
        // 列名はエイリアス（小文字）で届く
        .with("invoice link", link)
}

fn sheet() -> Vec<Row> {
    vec![
        invoice("Frank", "Approved", "", "03/02/2024 10:00:00", "$1,200.00", "https://drive.google.com/open?id=img1"),
        invoice("frank lopez", " approved ", "None", "03/01/2024 09:00:00", "300", "https://drive.google.com/file/d/img2/view"),
        invoice("Frank", "approved", "Paid", "03/01/2024 08:00:00", "999", ""),
        invoice("Htin", "Pending", "", "03/01/2024 08:00:00", "50", ""),
        invoice("Htin", "aprobado", "nan", "not a date", "75.5", ""),
        Row::new()
            .with("Name", CellValue::Empty)
            .with("Approval Status", "approved")
            .with("Invoice Status", ""),
    ]
}

fn session(rows: Vec<Row>, output_dir: &std::path::Path) -> InvoiceSession {
    let mut files = HashMap::new();
    files.insert("img1".to_string(), png(1200, 1600));
    let config = Config {
        output_dir: output_dir.to_path_buf(),
        ..Config::default()
    };
    InvoiceSession::new(config, Arc::new(FakeSource { rows }), Arc::new(FakeStore { files }))
}

#[tokio::test]
async fn test_refresh_keeps_approved_unpaid_in_timestamp_order() {
    let dir = tempdir().expect("Failed to create temp dir");
    let session = session(sheet(), dir.path());

    let refreshed = session.refresh().await.unwrap();

    assert_eq!(refreshed.fetched, 6);
    assert_eq!(refreshed.pending.len(), 4);
    let names: Vec<String> = refreshed.pending.iter().map(|r| r.text("Name")).collect();
    // 時刻順、解釈できない時刻は末尾
    assert_eq!(names, vec!["frank lopez", "frank", "htin", ""]);
    assert_eq!(refreshed.pending[0].text("Approval Status"), "approved");
    assert!(refreshed.pending[0].has_column("Invoice Link"));
}

#[tokio::test]
async fn test_select_and_summary() {
    let dir = tempdir().expect("Failed to create temp dir");
    let session = session(sheet(), dir.path());
    let refreshed = session.refresh().await.unwrap();

    let selection = session.select(&refreshed, "FRANK");
    assert_eq!(selection.rows.len(), 2);
    assert!((selection.total - 1500.0).abs() < 1e-9);
    assert_eq!(selection.display[0].location, "1200 First St NE");
    assert_eq!(selection.image_refs.len(), 2);

    let summary = session.summarize(&refreshed);
    let htin = summary.iter().find(|s| s.name == "htin").unwrap();
    assert_eq!(htin.items, 1);
    assert!((htin.amount - 75.5).abs() < 1e-9);

    let nobody = session.select(&refreshed, "zzz");
    assert!(nobody.is_empty());
    assert_eq!(nobody.total, 0.0);
}

#[tokio::test]
async fn test_full_pipeline_with_one_unavailable_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    let session = session(sheet(), dir.path());
    let refreshed = session.refresh().await.unwrap();
    let selection = session.select(&refreshed, "frank");

    let images = session.resolve_images(&selection).await;
    // 行順: frank lopez (img2, 権限なし) → frank (img1)
    assert_eq!(images.len(), 2);
    assert!(images[0].is_none());
    let second = images[1].as_ref().unwrap();
    assert_eq!(second.id, "img1");
    assert_eq!((second.width(), second.height()), (600, 800));

    let output = session.generate_report(&selection, &images, None).unwrap();
    assert_eq!(output.table_rows, 2);
    assert_eq!(output.image_pages, 1);
    assert!(output.path.starts_with(dir.path()));
}

#[tokio::test]
async fn test_refresh_propagates_source_failure() {
    let session = InvoiceSession::new(
        Config::default(),
        Arc::new(BrokenSource),
        Arc::new(FakeStore { files: HashMap::new() }),
    );
    let err = session.refresh().await.unwrap_err();
    assert!(matches!(err, InvoiceError::SourceUnavailable(_)));
}

#[tokio::test]
async fn test_empty_sheet() {
    let dir = tempdir().expect("Failed to create temp dir");
    let session = session(Vec::new(), dir.path());
    let refreshed = session.refresh().await.unwrap();
    assert!(refreshed.pending.is_empty());
}

fn collect_events(session: InvoiceSession, name: &str) -> Vec<JobEvent> {
    let rx = spawn_report_job(
        Arc::new(session),
        ReportRequest {
            name: name.to_string(),
            output_dir: None,
        },
    );
    let mut events = Vec::new();
    while let Ok(event) = rx.recv_timeout(Duration::from_secs(30)) {
        let done = event.is_terminal();
        events.push(event);
        if done {
            break;
        }
    }
    events
}

#[test]
fn test_worker_reports_progress_and_finishes() {
    let dir = tempdir().expect("Failed to create temp dir");
    let events = collect_events(session(sheet(), dir.path()), "frank");

    assert!(matches!(events.first(), Some(JobEvent::Status(_))));
    assert!(events.iter().any(|e| matches!(e, JobEvent::Loaded { fetched: 6, pending: 4 })));
    assert!(events.iter().any(|e| matches!(e, JobEvent::Selected { items: 2, links: 2, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, JobEvent::ImagesResolved { available: 1, requested: 2 })));
    match events.last() {
        Some(JobEvent::Finished(output)) => {
            assert!(output.path.exists());
            assert_eq!(output.image_pages, 1);
        }
        other => panic!("expected Finished, got {:?}", other),
    }
}

#[test]
fn test_worker_reports_load_failure() {
    let session = InvoiceSession::new(
        Config::default(),
        Arc::new(BrokenSource),
        Arc::new(FakeStore { files: HashMap::new() }),
    );
    let events = collect_events(session, "frank");

    match events.last() {
        Some(JobEvent::Failed { step, message }) => {
            assert_eq!(*step, JobStep::Load);
            assert!(message.contains("does not exist"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn test_worker_without_matching_rows_writes_nothing() {
    let dir = tempdir().expect("Failed to create temp dir");
    let events = collect_events(session(sheet(), dir.path()), "zzz");

    assert!(events.iter().any(|e| matches!(e, JobEvent::Selected { items: 0, links: 0, .. })));
    match events.last() {
        Some(JobEvent::NothingToReport { name }) => assert_eq!(name, "zzz"),
        other => panic!("expected NothingToReport, got {:?}", other),
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_job_stops_when_receiver_is_dropped() {
    let dir = tempdir().expect("Failed to create temp dir");
    let (release_tx, release_rx) = mpsc::channel();
    let (dropped_tx, dropped_rx) = mpsc::channel();
    let source = GatedSource {
        rows: sheet(),
        release: Mutex::new(release_rx),
        dropped: dropped_tx,
    };
    let mut files = HashMap::new();
    files.insert("img1".to_string(), png(1200, 1600));
    let config = Config {
        output_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let session = InvoiceSession::new(config, Arc::new(source), Arc::new(FakeStore { files }));

    let rx = spawn_report_job(
        Arc::new(session),
        ReportRequest {
            name: "frank".to_string(),
            output_dir: None,
        },
    );
    // 取得中に受信側を捨てる
    assert!(matches!(rx.recv_timeout(Duration::from_secs(30)), Ok(JobEvent::Status(_))));
    drop(rx);
    release_tx.send(()).unwrap();

    // スレッドが終わるとセッションごと取得元が破棄される
    dropped_rx
        .recv_timeout(Duration::from_secs(30))
        .expect("job kept running after the receiver was dropped");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
