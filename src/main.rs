//! planroom command line: run the server and administer users.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use planroom::config::{Loader, Overrides};
use planroom::store::users;
use planroom::{SystemRole, api, auth, db, server};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "planroom", version, about = "Business-plan collaboration backend")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database URL (file path, :memory: or libsql://)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Token signing secret (at least 32 bytes)
    #[arg(long, global = true)]
    jwt_secret: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Register a user, e.g. the first administrator
    AddUser {
        email: String,
        #[arg(long)]
        admin: bool,
    },
    /// Print a bearer token for an existing user
    Token { email: String },
}

#[tokio::main]
async fn main() -> planroom::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("planroom=info")),
        )
        .init();

    let cli = Cli::parse();
    let (host, port) = match &cli.command {
        Command::Serve { host, port } => (host.as_deref(), *port),
        _ => (None, None),
    };
    let config = Loader::default().load(
        cli.config.as_deref(),
        &Overrides {
            host,
            port,
            database_url: cli.database_url.as_deref(),
            jwt_secret: cli.jwt_secret.as_deref(),
        },
    )?;

    let handle = db::open(&config.database.url).await?;

    match cli.command {
        Command::Serve { .. } => {
            let router = api::router();
            server::run(config, Some(handle), router.into_handle()).await
        }
        Command::AddUser { email, admin } => {
            let role = if admin {
                SystemRole::Administrator
            } else {
                SystemRole::Regular
            };
            let conn = db::connection(&handle)?;
            let user = users::create(&conn, &email, role).await?;
            println!("{}", user.id);
            Ok(())
        }
        Command::Token { email } => {
            let conn = db::connection(&handle)?;
            let user = users::find_by_email(&conn, &email)
                .await?
                .filter(|user| user.active)
                .ok_or_else(|| planroom::Error::NotFound(format!("active user {email}")))?;
            println!("{}", auth::create_token(&config.auth, &user.id)?);
            Ok(())
        }
    }
}
