use metagen_core::{BatchObserver, BatchReport, ContentRecord, GeneratedMeta, RecordOutcome};
use owo_colors::OwoColorize;

use crate::VERSION;

/// Titles longer than this are shortened in progress lines.
const TITLE_WIDTH: usize = 50;

/// Print a styled banner with the configured record limit
pub fn print_banner(limit: Option<u64>) {
    let limit = limit.map_or_else(|| "all".to_string(), |n| n.to_string());
    eprintln!(
        "\n{} {} {}",
        "metagen".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!(
        "{} {}\n",
        "Generating SEO metadata, limit:".dimmed(),
        limit.bright_white()
    );
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print the final tally to stdout
pub fn print_summary(report: &BatchReport) {
    println!("\n{}", "═".repeat(60).dimmed());
    println!("{}", "Results".bold().cyan());
    println!("{}", "═".repeat(60).dimmed());
    println!("  {:<28} {}", "Updated:", report.success.to_string().bright_green());
    println!("  {:<28} {}", "Skipped (empty text):", report.skipped_empty);
    println!("  {:<28} {}", "Skipped (state = 0):", report.skipped_state);
    println!("  {:<28} {}", "Skipped (API errors):", report.skipped_api_errors);
    println!("  {:<28} {}", "Skipped (database errors):", report.skipped_db_errors);
    println!("  {:<28} {}\n", "Total records:".bold(), report.total.to_string().bold());
}

/// Console progress for a running batch
pub struct ConsoleObserver;

impl BatchObserver for ConsoleObserver {
    fn batch_started(&self, total: usize) {
        if total == 0 {
            print_warning("No records to process");
        } else {
            print_info(&format!("Found {} records", total));
        }
    }

    fn record_started(&self, index: usize, total: usize, record: &ContentRecord) {
        eprintln!(
            "\n{} {}",
            format!("[{}/{}]", index, total).dimmed(),
            format!("ID {}", record.id).bright_cyan()
        );
        eprintln!("  {} {}", "Title:".dimmed(), record.short_title(TITLE_WIDTH).bright_white());
    }

    fn generating(&self, _record: &ContentRecord) {
        eprintln!("  {}", "Generating metadata...".dimmed());
    }

    fn metadata_generated(&self, _record: &ContentRecord, meta: &GeneratedMeta) {
        eprintln!("  {} {}", "Keywords:".dimmed(), meta.meta_keywords.bright_white());
        eprintln!("  {} {}", "Description:".dimmed(), meta.meta_description.bright_white());
    }

    fn record_finished(&self, _record: &ContentRecord, outcome: RecordOutcome, detail: Option<&str>) {
        match outcome {
            RecordOutcome::Success => print_success("Updated in database"),
            RecordOutcome::SkippedState => print_warning("Skipped: record is not published (state = 0)"),
            RecordOutcome::SkippedEmpty => print_warning("Skipped: no text in fulltext or introtext"),
            RecordOutcome::SkippedApiError => {
                print_error(&format!("Skipped: metadata generation failed ({})", detail.unwrap_or("unknown error")))
            }
            RecordOutcome::SkippedDbError => {
                print_error(&format!("Skipped: {}", detail.unwrap_or("database update failed")))
            }
        }
    }
}
