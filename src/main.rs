use std::sync::Arc;

use color_eyre::{Result, eyre::eyre};

use dui::{aws, dynamodb::DynamoBackend};

mod app;
mod config;
mod logging;
mod subcommands;
mod ui;
mod util;

#[derive(clap::Parser)]
#[command(
    name = "dui",
    version,
    about = "Terminal UI for browsing and editing DynamoDB items",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v, -vv, etc.)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Endpoint URL for the DynamoDB service [env: DDB_ENDPOINT]
    #[arg(short, long, global = true, visible_alias = "endpoint-url")]
    endpoint: Option<String>,

    /// Table to open on start-up
    #[arg(short, long)]
    table: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the names of all tables
    ListTables {
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| eyre!("failed to install aws-lc-rs crypto provider"))?;

    color_eyre::install()?;
    let cli = <Cli as clap::Parser>::parse();
    let log_path = logging::init(cli.verbose)?;
    let config = config::Config::load(cli.endpoint.as_deref(), cli.table);
    tracing::info!(endpoint = %config.endpoint, log = ?log_path, "starting");

    let client = aws::new_client(&config.endpoint).await;
    let backend = Arc::new(DynamoBackend::new(client));
    match cli.command {
        Some(Commands::ListTables { json }) => {
            let options = subcommands::list_tables::Options { json };
            subcommands::list_tables::command(backend.as_ref(), options).await
        }
        None => {
            let theme = ui::Theme::detect();
            app::App::new(backend, &config, theme).run_tui().await
        }
    }
}
