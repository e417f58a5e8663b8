//! Watch command - keep polling and redraw on every change.

use anyhow::Result;
use chrono::Local;
use servicedash_core::{DashboardEngine, DashboardView};

use crate::ViewArgs;

pub async fn run(endpoint: Option<&str>, args: &ViewArgs, json: bool) -> Result<()> {
    let config = super::effective_config(endpoint, Some(args)).await?;
    let engine = DashboardEngine::from_config(&config)?;
    if let Some(page) = args.page {
        engine.set_page(page);
    }

    let mut updates = engine.subscribe();
    engine.start();
    if !json {
        render(&engine.view());
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = engine.view();
                if json {
                    println!("{}", serde_json::to_string(&view)?);
                } else {
                    render(&view);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    engine.stop();
    Ok(())
}

fn render(view: &DashboardView) {
    // Clear screen, cursor home
    print!("\x1B[2J\x1B[H");

    if view.is_loading() {
        println!("Loading services...");
        return;
    }

    super::list::print_table(view);

    let updated = view
        .updated_at
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!("Updated {} - Ctrl+C to quit", updated);

    if let Some(error) = &view.error {
        println!("! {} ({})", error.message, error.detail);
    }
}
