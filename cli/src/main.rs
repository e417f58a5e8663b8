//! servicedash CLI - Watch services listening on local ports
//!
//! A command-line front-end over the dashboard engine: one-shot listings,
//! a detail view, a live-refreshing watch mode and the effective config.

mod commands;

use clap::{ArgAction, Args, Parser, Subcommand};
use servicedash_core::{ConfigKey, SortField};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "servicedash")]
#[command(author, version, about = "Watch services listening on local ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Services endpoint (overrides the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

/// Sort and page flags shared by `list` and `watch`.
#[derive(Args, Clone, Debug, Default)]
pub struct ViewArgs {
    /// Sort field: port, status, process, pid, user, command_line, start_time, recognized
    #[arg(short, long)]
    sort: Option<SortField>,

    /// Sort in descending order
    #[arg(long)]
    desc: bool,

    /// Page to show (1-based)
    #[arg(short, long)]
    page: Option<usize>,

    /// Rows per page: 10, 20, 50 or 100
    #[arg(long, value_parser = parse_page_size)]
    page_size: Option<usize>,

    /// Let the server sort and page
    #[arg(long)]
    server_paging: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List services once
    #[command(alias = "ls")]
    List(ViewArgs),

    /// Show every known field of one service
    Show {
        /// Port number of the service
        port: u16,
    },

    /// Keep polling and redraw on every change
    Watch(ViewArgs),

    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Change one setting in the config file
    Set {
        /// endpoint, refresh-interval, request-timeout, page-size,
        /// server-paging, sort-field or sort-direction
        key: ConfigKey,
        value: String,
    },
}

fn parse_page_size(raw: &str) -> Result<usize, String> {
    let size = raw.parse().map_err(|_| format!("not a number: {raw}"))?;
    servicedash_core::config::check_page_size(size).map_err(|e| e.to_string())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("servicedash={level},servicedash_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let endpoint = cli.endpoint.as_deref();
    match cli.command {
        Some(Commands::List(args)) => commands::list::run(endpoint, &args, cli.json).await?,
        Some(Commands::Show { port }) => commands::show::run(endpoint, port, cli.json).await?,
        Some(Commands::Watch(args)) => commands::watch::run(endpoint, &args, cli.json).await?,
        Some(Commands::Config { action }) => match action {
            None | Some(ConfigAction::Show) => commands::config::show(endpoint, cli.json).await?,
            Some(ConfigAction::Set { key, value }) => {
                commands::config::set(key, &value, cli.json).await?
            }
        },
        None => commands::list::run(endpoint, &ViewArgs::default(), cli.json).await?,
    }

    Ok(())
}
