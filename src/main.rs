use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use menubot_gateway::api::{ApiServer, ApiState};
use menubot_gateway::channels::WhatsAppChannel;
use menubot_gateway::{Config, Dispatcher, config};

/// Menubot - `WhatsApp` menu bot webhook gateway
#[derive(Parser)]
#[command(name = "menubot", version, about)]
struct Cli {
    /// Port to listen on (overrides `PORT`)
    #[arg(long)]
    port: Option<u16>,

    /// TOML menu file replacing the built-in menu (overrides `MENU_FILE`)
    #[arg(long, global = true)]
    menu: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved menu table and exit
    ShowMenu,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,menubot_gateway=info",
        1 => "info,menubot_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(Command::ShowMenu) = cli.command {
        return show_menu(cli.menu);
    }

    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.menu.is_some() {
        config.menu_file = cli.menu;
    }

    tracing::info!(
        port = config.server.port,
        menu_file = ?config.menu_file,
        api_url = %config.whatsapp.api_url,
        "starting menubot gateway"
    );

    let menu = config.menu()?;
    for document in menu.documents() {
        if !document.path.is_file() {
            tracing::warn!(
                path = %document.path.display(),
                "document file not found, its menu code will fail to send it"
            );
        }
    }
    tracing::debug!(entries = menu.entries().len(), case = %menu.case_policy(), "menu loaded");

    let Config {
        server,
        webhook,
        whatsapp,
        ..
    } = config;

    let state = ApiState {
        verify_token: webhook.verify_token,
        messenger: Arc::new(WhatsAppChannel::new(whatsapp)?),
        dispatcher: Dispatcher::new(menu),
    };

    ApiServer::new(state, server.port).run().await?;

    Ok(())
}

/// Print the menu that would be served
fn show_menu(menu_file: Option<PathBuf>) -> anyhow::Result<()> {
    let menu_file = menu_file.or_else(|| std::env::var_os("MENU_FILE").map(PathBuf::from));
    let menu = config::resolve_menu(menu_file.as_deref(), &config::document_from_env())?;
    println!("{menu}");
    Ok(())
}
