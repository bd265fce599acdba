//! Popular Revelation API server

use anyhow::Result;
use clap::{Parser, Subcommand};
use popular_revelation::{users::Role, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "poprev")]
#[command(about = "Popular Revelation content API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create an account with the given role
    CreateUser {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "POPREV_PASSWORD")]
        password: String,

        /// admin | editor | viewer
        #[arg(long, default_value = "admin")]
        role: Role,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,popular_revelation=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            popular_revelation::start_server(config).await
        }
        Commands::CreateUser {
            name,
            email,
            password,
            role,
        } => create_user(config, &name, &email, &password, role).await,
    }
}

async fn create_user(
    config: Config,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<()> {
    let state = AppState::new(config).await?;
    let users = popular_revelation::users::UserManager::new(
        state.store.clone(),
        state.config.auth_config.clone(),
    );

    let user = users.create_user(name, email, password, role).await?;
    tracing::info!("Created {} account {} ({})", user.role, user.email, user.id);
    Ok(())
}
