//! Config command - show or change the configuration.

use anyhow::Result;
use servicedash_core::{ConfigKey, ConfigStore};

pub async fn show(endpoint: Option<&str>, json: bool) -> Result<()> {
    let config = super::effective_config(endpoint, None).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let store = ConfigStore::new()?;
    println!("Config file:      {}", store.path().display());
    println!("Endpoint:         {}", config.endpoint);
    println!("Refresh interval: {}s", config.refresh_interval().as_secs());
    println!("Request timeout:  {}s", config.request_timeout().as_secs());
    println!("Page size:        {}", config.page_size);
    println!("Paging:           {:?}", config.paging_mode());
    println!(
        "Sort:             {} ({})",
        config.sort_field.display_name(),
        config.sort_direction.as_str()
    );

    Ok(())
}

pub async fn set(key: ConfigKey, value: &str, json: bool) -> Result<()> {
    let store = ConfigStore::new()?;
    let config = store.set(key, value).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("Set {} = {} in {}", key, value, store.path().display());
    }
    Ok(())
}
