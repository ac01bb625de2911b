use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "invoice-report")]
#[command(about = "承認済み・未払いの請求を下請業者ごとにPDFへまとめるツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Sheets API の代わりにローカルのブック（xlsx/xls/ods）を読む
    #[arg(long, global = true)]
    pub workbook: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 下請業者ごとの未払い件数・金額を一覧表示
    Pending,

    /// 下請業者の請求表と画像の取得状況を表示
    Show {
        /// 下請業者名（部分一致、省略時は名簿から選択）
        #[arg(short, long)]
        name: Option<String>,

        /// 画像の取得を行わない
        #[arg(long)]
        no_images: bool,
    },

    /// 下請業者の請求PDFを生成
    Report {
        /// 下請業者名（部分一致、省略時は名簿から選択）
        #[arg(short, long)]
        name: Option<String>,

        /// 出力ディレクトリ（省略時は設定の output_dir）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// スプレッドシートIDを設定
        #[arg(long)]
        set_spreadsheet_id: Option<String>,

        /// 読み込むタブ名を設定
        #[arg(long)]
        set_sheet_name: Option<String>,

        /// PDFの出力先を設定
        #[arg(long)]
        set_output_dir: Option<PathBuf>,

        /// アクセストークンを保存（環境変数 GOOGLE_ACCESS_TOKEN が優先）
        #[arg(long)]
        set_access_token: Option<String>,

        /// 名簿に下請業者を追加
        #[arg(long)]
        add_subcontractor: Option<String>,
    },
}
