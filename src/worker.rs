//! バックグラウンドでのレポート生成
//!
//! 呼び出し側はブロックせずに `try_recv` で進捗を受け取る。
//! Receiver を破棄すると、以降の結果は捨てられる。

use crate::export::ReportOutput;
use crate::pipeline::InvoiceSession;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub name: String,
    pub output_dir: Option<PathBuf>,
}

/// 失敗した段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStep {
    Runtime,
    Load,
    Report,
}

impl fmt::Display for JobStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStep::Runtime => "startup",
            JobStep::Load => "loading invoices",
            JobStep::Report => "writing report",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum JobEvent {
    Status(String),
    Loaded { fetched: usize, pending: usize },
    Selected { items: usize, total: f64, links: usize },
    ImagesResolved { available: usize, requested: usize },
    Finished(ReportOutput),
    /// 該当行が無いのでPDFは書かない
    NothingToReport { name: String },
    Failed { step: JobStep, message: String },
}

impl JobEvent {
    /// これ以上イベントが来ないか
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobEvent::Finished(_) | JobEvent::NothingToReport { .. } | JobEvent::Failed { .. }
        )
    }
}

/// 受信側が居なくなったら false
fn emit(tx: &Sender<JobEvent>, event: JobEvent) -> bool {
    tx.send(event).is_ok()
}

pub fn spawn_report_job(session: Arc<InvoiceSession>, request: ReportRequest) -> Receiver<JobEvent> {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = tx.send(JobEvent::Failed {
                    step: JobStep::Runtime,
                    message: err.to_string(),
                });
                return;
            }
        };
        runtime.block_on(run_job(&session, &request, &tx));
    });

    rx
}

async fn run_job(session: &InvoiceSession, request: &ReportRequest, tx: &Sender<JobEvent>) {
    if !emit(tx, JobEvent::Status(format!("Loading {}...", session.source_name()))) {
        return;
    }

    let refreshed = match session.refresh().await {
        Ok(refreshed) => refreshed,
        Err(err) => {
            let _ = tx.send(JobEvent::Failed { step: JobStep::Load, message: err.to_string() });
            return;
        }
    };
    let loaded = JobEvent::Loaded {
        fetched: refreshed.fetched,
        pending: refreshed.pending.len(),
    };
    if !emit(tx, loaded) {
        return;
    }

    let selection = session.select(&refreshed, &request.name);
    let selected = JobEvent::Selected {
        items: selection.rows.len(),
        total: selection.total,
        links: selection.image_refs.len(),
    };
    if !emit(tx, selected) {
        return;
    }
    if selection.is_empty() {
        let _ = tx.send(JobEvent::NothingToReport { name: selection.name });
        return;
    }

    if !selection.image_refs.is_empty()
        && !emit(tx, JobEvent::Status(format!("Fetching {} images...", selection.image_refs.len())))
    {
        return;
    }
    let images = session.resolve_images(&selection).await;
    let resolved = JobEvent::ImagesResolved {
        available: images.iter().filter(|i| i.is_some()).count(),
        requested: images.len(),
    };
    if !emit(tx, resolved) || !emit(tx, JobEvent::Status("Writing PDF...".to_string())) {
        return;
    }

    let event = match session.generate_report(&selection, &images, request.output_dir.as_deref()) {
        Ok(output) => JobEvent::Finished(output),
        Err(err) => JobEvent::Failed { step: JobStep::Report, message: err.to_string() },
    };
    let _ = tx.send(event);
}
