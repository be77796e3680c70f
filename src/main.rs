use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_store::{
    cli::{Cli, Command, CommandArguments},
    error::ServiceResult,
    metadata::{PKG_NAME, PKG_VERSION},
    requests::request_schemas,
    server,
};

#[tokio::main]
async fn main() -> ServiceResult<()> {
    // Loaded before parsing so clap sees the variables.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!("Ignoring unreadable .env file: {err}"),
    }

    match Cli::parse().command {
        Command::Start(args) => {
            if let Err(err) = server::start_server(args).await {
                tracing::error!("Server stopped with error: {err}");
                return Err(err);
            }
            Ok(())
        }
        Command::Status(args) => {
            print_status(&args);
            Ok(())
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&request_schemas())?);
            Ok(())
        }
        Command::Version => {
            println!("{PKG_NAME} {PKG_VERSION}");
            Ok(())
        }
    }
}

fn print_status(args: &CommandArguments) {
    let store = if args.in_memory { "memory" } else { "mongodb" };
    println!("{}", format!("{PKG_NAME} v{PKG_VERSION}").bold());
    println!("  {:<16} {}", "store:", store);
    println!("  {:<16} {}", "mongodb uri:", args.masked_uri());
    println!("  {:<16} {}/{}", "collection:", args.database, args.collection);
    println!("  {:<16} {}", "http address:", args.http_addr);
    println!(
        "  {:<16} {}..={}",
        "pool size:", args.min_pool_size, args.max_pool_size
    );
    println!("  {:<16} {}", "cors origins:", args.allowed_origins.join(", "));
    match args.validate() {
        Ok(()) => println!("  {}", "configuration is valid".green()),
        Err(err) => println!("  {} {err}", "invalid:".red()),
    }
}
