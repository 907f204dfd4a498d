//! Upload command handler

use anyhow::{Context, Result};
use colored::*;
use std::time::Instant;

use super::Cli;
use crate::config::Config;
use crate::sheets::{MemorySink, SheetsClient, SinkCall};
use crate::upload::{UploadOptions, UploadProgress, UploadSummary, upload_catalog};

/// Upload the configured feed into the spreadsheet named on the command line
pub async fn handle_upload_command(args: Cli, mut config: Config) -> Result<()> {
    args.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    let input = config.feed.input.clone();
    let options = UploadOptions {
        sheet_prefix: config.sheets.sheet_prefix.clone(),
        record_path: config.feed.record_path.clone(),
    };

    if args.verbose > 0 {
        println!("Reading feed from: {}", input.display().to_string().cyan());
        println!("Target spreadsheet: {}", args.id.bright_green().bold());
        println!();
    }

    let start = Instant::now();
    let summary = if args.dry_run {
        let mut sink = MemorySink::new(config.sheets.rows_limit);
        let summary = upload_catalog(&input, &args.id, &mut sink, &options, print_progress).await?;
        print_dry_run(&sink, args.verbose > 0);
        summary
    } else {
        let mut sink = SheetsClient::new(&config.sheets)?;
        upload_catalog(&input, &args.id, &mut sink, &options, print_progress).await?
    };

    println!();
    println!(
        "{}",
        "Your XML data was transferred successfully.".green().bold()
    );
    if args.verbose > 0 {
        print_summary(&summary);
        println!(
            "Total time: {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    Ok(())
}

fn print_progress(progress: &UploadProgress<'_>) {
    println!(
        "{} rows updated at {}.",
        progress.sheet_rows.to_string().bold(),
        progress.sheet.cyan()
    );
}

fn print_dry_run(sink: &MemorySink, verbose: bool) {
    println!();
    println!(
        "{} nothing was sent to spreadsheet {} ({} requests skipped)",
        "Dry run:".yellow().bold(),
        sink.spreadsheet_id().unwrap_or("-"),
        sink.calls().len()
    );
    if verbose {
        for call in sink.calls() {
            let line = match call {
                SinkCall::Load(id) => format!("load spreadsheet {}", id),
                SinkCall::AddSheet(title) => format!("add sheet {}", title),
                SinkCall::Write { range, rows } => format!("write {} rows at {}", rows, range),
            };
            println!("  {}", line.dimmed());
        }
    }
    for sheet in sink.sheets() {
        let header = sheet.rows.first().map(|r| r.join(", ")).unwrap_or_default();
        println!(
            "  {} {} rows [{}]",
            sheet.title.cyan(),
            sheet.rows.len(),
            header.dimmed()
        );
    }
}

fn print_summary(summary: &UploadSummary) {
    println!(
        "{} data rows across {} sheet(s)",
        summary.data_rows,
        summary.sheets.len()
    );
    for sheet in &summary.sheets {
        println!(
            "  {}: {} rows ({} header, {} data)",
            sheet.name.cyan(),
            sheet.rows(),
            sheet.header_rows,
            sheet.data_rows
        );
    }
}
