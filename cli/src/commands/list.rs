//! List command - show one page of services.

use anyhow::{bail, Result};
use servicedash_core::{CycleOutcome, DashboardView, HttpServiceSource, PollLoop, ServiceRow};

use crate::ViewArgs;

pub async fn run(endpoint: Option<&str>, args: &ViewArgs, json: bool) -> Result<()> {
    let config = super::effective_config(endpoint, Some(args)).await?;
    let source = HttpServiceSource::new(&config.endpoint, config.request_timeout())?;
    let poll = PollLoop::new(source, config.poll_options());
    if let Some(page) = args.page {
        poll.set_page(page);
    }

    // A server page past the end is clamped once and asked for again.
    if poll.refresh().await == CycleOutcome::Reissue {
        poll.refresh().await;
    }

    let view = poll.view();
    if let Some(error) = &view.error {
        bail!("{}: {}", error.message, error.detail);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print_table(&view);
    Ok(())
}

/// Print the rows of a view followed by the page footer.
pub fn print_table(view: &DashboardView) {
    if view.rows.is_empty() {
        println!("No services found.");
    } else {
        println!(
            "{:<6} {:<12} {:<20} {:<8} {:<10} {:<12} COMMAND",
            "PORT", "STATUS", "PROCESS", "PID", "USER", "TYPE"
        );
        println!("{}", "-".repeat(90));

        for row in &view.rows {
            print_row(row);
        }
    }

    println!(
        "\nPage {} of {} - {} services, sorted by {} ({})",
        view.page,
        view.page_count.max(1),
        view.total,
        view.sort.field.display_name(),
        view.sort.direction.as_str()
    );
}

fn print_row(row: &ServiceRow) {
    let record = &row.record;
    let pid = record.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
    let kind = row.recognized.map(|r| r.label).unwrap_or("-");

    println!(
        "{:<6} {:<12} {:<20} {:<8} {:<10} {:<12} {}",
        record.port,
        truncate(&record.status, 12),
        truncate(record.process.as_deref().unwrap_or("-"), 20),
        pid,
        truncate(record.user.as_deref().unwrap_or("-"), 10),
        kind,
        truncate(record.command_line.as_deref().unwrap_or(""), 40)
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
