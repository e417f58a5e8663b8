//! Subcommand implementations.

pub mod config;
pub mod list;
pub mod show;
pub mod watch;

use anyhow::{Context, Result};
use servicedash_core::{Config, ConfigStore, SortDirection};

use crate::ViewArgs;

/// Load the config file and apply command-line overrides.
pub async fn effective_config(endpoint: Option<&str>, args: Option<&ViewArgs>) -> Result<Config> {
    let store = ConfigStore::new()?;
    let mut config = store
        .load()
        .await
        .with_context(|| format!("loading {}", store.path().display()))?;

    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint.to_string();
    }
    if let Some(args) = args {
        if let Some(field) = args.sort {
            config.sort_field = field;
            config.sort_direction = SortDirection::Ascending;
        }
        if args.desc {
            config.sort_direction = SortDirection::Descending;
        }
        if let Some(page_size) = args.page_size {
            config.page_size = page_size;
        }
        if args.server_paging {
            config.server_paging = true;
        }
    }

    tracing::debug!(?config, "Effective configuration");
    Ok(config)
}
