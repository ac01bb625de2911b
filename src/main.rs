use anyhow::{bail, Context};
use clap::Parser;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use invoice_report::{cli, config, pipeline, worker};
use invoice_report_common::export::pdf_core::title_case;
use invoice_report_common::{format_currency, SubcontractorSummary};
use cli::{Cli, Commands};
use config::Config;
use pipeline::{InvoiceSession, Selection};
use std::sync::mpsc::TryRecvError;
use std::sync::Arc;
use std::time::Duration;
use worker::{spawn_report_job, JobEvent, ReportRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load().context("failed to load config")?;

    match cli.command {
        Commands::Pending => {
            println!("📄 invoice-report - pending invoices\n");
            let session = InvoiceSession::from_config(config, cli.workbook)?;

            println!("- Loading {}...", session.source_name());
            let refreshed = session.refresh().await.context("failed to load invoices")?;
            println!("✔ {} of {} rows approved and unpaid\n", refreshed.pending.len(), refreshed.fetched);

            for summary in session.summarize(&refreshed) {
                print_summary_line(&summary);
            }
        }

        Commands::Show { name, no_images } => {
            println!("📄 invoice-report - invoice table\n");
            let session = InvoiceSession::from_config(config, cli.workbook)?;

            println!("- Loading {}...", session.source_name());
            let refreshed = session.refresh().await.context("failed to load invoices")?;

            let name = match name {
                Some(name) => name,
                None => prompt_subcontractor(&session.summarize(&refreshed))?,
            };
            let selection = session.select(&refreshed, &name);
            if selection.is_empty() {
                println!("No approved, unpaid invoices for {}", title_case(&name));
                return Ok(());
            }
            print_selection(&selection);

            if !no_images && !selection.image_refs.is_empty() {
                println!("\n- Fetching {} images...", selection.image_refs.len());
                let images = session.resolve_images(&selection).await;
                for (reference, image) in selection.image_refs.iter().zip(&images) {
                    match image {
                        Some(image) => println!("  ✔ {}x{}  {}", image.width(), image.height(), reference),
                        None => println!("  ✘ unavailable  {}", reference),
                    }
                }
            }
        }

        Commands::Report { name, output } => {
            println!("📄 invoice-report - PDF report\n");
            let name = match name {
                Some(name) => name,
                None => prompt_roster(&config.subcontractors)?,
            };
            let session = Arc::new(InvoiceSession::from_config(config, cli.workbook)?);
            run_report(session, ReportRequest { name, output_dir: output }).await?;
        }

        Commands::Config {
            show,
            set_spreadsheet_id,
            set_sheet_name,
            set_output_dir,
            set_access_token,
            add_subcontractor,
        } => {
            let mut config = config;

            if let Some(id) = set_spreadsheet_id {
                config.set_spreadsheet_id(id)?;
                println!("✔ Spreadsheet id saved");
            }
            if let Some(sheet) = set_sheet_name {
                config.set_sheet_name(sheet)?;
                println!("✔ Sheet name saved");
            }
            if let Some(dir) = set_output_dir {
                config.set_output_dir(dir)?;
                println!("✔ Output directory saved");
            }
            if let Some(token) = set_access_token {
                config.set_access_token(token)?;
                println!("✔ Access token saved");
            }
            if let Some(name) = add_subcontractor {
                if config.add_subcontractor(name.clone())? {
                    println!("✔ Added {} to the roster", name.trim());
                } else {
                    println!("{} is already on the roster", name.trim());
                }
            }

            if show {
                println!("Config ({}):", Config::config_path()?.display());
                println!("  Spreadsheet: {}", if config.spreadsheet_id.is_empty() { "(not set)" } else { config.spreadsheet_id.as_str() });
                println!("  Sheet: {}", config.sheet_name);
                println!("  Output: {}", config.output_dir.display());
                println!("  Access token: {}", if config.get_access_token().is_ok() { "set" } else { "not set" });
                println!("  Image concurrency: {}", config.image_concurrency);
                println!("  Image size: {}x{}px", config.max_image_width, config.max_image_height);
                println!("  Roster: {}", config.subcontractors.join(", "));
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary_line(summary: &SubcontractorSummary) {
    println!(
        "  {:<16} {:>3} items  {:>12}",
        title_case(&summary.name),
        summary.items,
        format_currency(summary.amount)
    );
}

fn print_selection(selection: &Selection) {
    println!("\n{}\n", title_case(&selection.name));
    println!("  {:<40} {:<10} {:<10} {:>12}  Invoice Link", "Location", "Invoice #", "WO #", "Total");
    for row in &selection.display {
        let location: String = row.location.chars().take(40).collect();
        let link = if row.invoice_link.is_empty() { "No Link" } else { "View Invoice" };
        println!(
            "  {:<40} {:<10} {:<10} {:>12}  {}",
            location,
            row.invoice_number,
            row.work_order_number,
            format_currency(row.total),
            link
        );
    }
    println!("  {:>62} {:>12}", "TOTAL:", format_currency(selection.total));
}

/// 件数付きで名簿から選ぶ
fn prompt_subcontractor(summaries: &[SubcontractorSummary]) -> anyhow::Result<String> {
    if summaries.is_empty() {
        bail!("the subcontractor roster is empty; add one with `invoice-report config --add-subcontractor <NAME>`");
    }
    let items: Vec<String> = summaries
        .iter()
        .map(|s| format!("{} ({} items, {})", title_case(&s.name), s.items, format_currency(s.amount)))
        .collect();
    let index = Select::new()
        .with_prompt("Subcontractor")
        .items(&items)
        .default(0)
        .interact()
        .context("selection cancelled")?;
    Ok(summaries[index].name.clone())
}

fn prompt_roster(roster: &[String]) -> anyhow::Result<String> {
    if roster.is_empty() {
        bail!("the subcontractor roster is empty; add one with `invoice-report config --add-subcontractor <NAME>`");
    }
    let items: Vec<String> = roster.iter().map(|name| title_case(name)).collect();
    let index = Select::new()
        .with_prompt("Subcontractor")
        .items(&items)
        .default(0)
        .interact()
        .context("selection cancelled")?;
    Ok(roster[index].clone())
}

/// バックグラウンドで生成し、スピナーで進捗を表示する
async fn run_report(session: Arc<InvoiceSession>, request: ReportRequest) -> anyhow::Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let events = spawn_report_job(session, request);
    loop {
        let event = match events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }
            Err(TryRecvError::Disconnected) => {
                spinner.finish_and_clear();
                bail!("report job stopped unexpectedly");
            }
        };

        match event {
            JobEvent::Status(message) => spinner.set_message(message),
            JobEvent::Loaded { fetched, pending } => {
                spinner.println(format!("✔ {} of {} rows approved and unpaid", pending, fetched));
            }
            JobEvent::Selected { items, total, links } => {
                spinner.println(format!("✔ {} invoices, {} links, total {}", items, links, format_currency(total)));
            }
            JobEvent::ImagesResolved { available, requested } => {
                if requested > 0 {
                    spinner.println(format!("✔ {}/{} images available", available, requested));
                }
            }
            JobEvent::Finished(output) => {
                spinner.finish_and_clear();
                println!("✔ Report written: {}", output.path.display());
                println!(
                    "  {} rows, {} image pages, total {}",
                    output.table_rows,
                    output.image_pages,
                    format_currency(output.total)
                );
                return Ok(());
            }
            JobEvent::NothingToReport { name } => {
                spinner.finish_and_clear();
                println!("No data to generate PDF for {}", title_case(&name));
                return Ok(());
            }
            JobEvent::Failed { step, message } => {
                spinner.finish_and_clear();
                bail!("{} failed: {}", step, message);
            }
        }
    }
}
