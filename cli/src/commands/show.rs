//! Show command - detail view of one service.

use anyhow::{Context, Result};
use servicedash_core::{HttpServiceSource, PollLoop, ServiceRow};

pub async fn run(endpoint: Option<&str>, port: u16, json: bool) -> Result<()> {
    let config = super::effective_config(endpoint, None).await?;
    let source = HttpServiceSource::new(&config.endpoint, config.request_timeout())?;
    let poll = PollLoop::new(source, config.poll_options());

    let record = poll
        .fetch_detail(port)
        .await
        .with_context(|| format!("fetching service on port {}", port))?;
    let row = ServiceRow::new(record);

    if json {
        println!("{}", serde_json::to_string_pretty(&row)?);
        return Ok(());
    }

    for (name, value) in row.record.fields() {
        println!("{:<14} {}", format!("{name}:"), value);
    }
    match row.recognized {
        Some(rule) => println!("{:<14} {} ({})", "recognized:", rule.label, rule.color),
        None => println!("{:<14} -", "recognized:"),
    }

    Ok(())
}
