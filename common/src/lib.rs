//! Invoice Report Common Library
//!
//! 請求データの型・フィルタ・表レイアウトなど、I/Oを持たない共通処理

pub mod types;
pub mod alias;
pub mod error;
pub mod filter;
pub mod location;
pub mod amount;
pub mod reference;
pub mod timestamp;
pub mod layout;
pub mod export;

pub use types::{columns, rows_from_grid, CellValue, DisplayRow, Row};
pub use alias::{ColumnAliases, ResolvedColumns};
pub use error::{Error, Result};
pub use filter::{
    filter_approved_unpaid, filter_by_subcontractor, image_references, prepare_display,
    subcontractor_summary, SubcontractorSummary,
};
pub use location::clean_location;
pub use amount::{format_cell_currency, format_currency, parse_amount, total_sum};
pub use reference::extract_reference_id;
pub use timestamp::{cell_timestamp, parse_timestamp, timestamp_from_serial};
pub use export::pdf_core::{build_report_table, report_file_name, ReportTable, TableRow};
