use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use minidrive::db::UserRepository;
use minidrive::web::WebServer;
use minidrive::{Config, Database, Role};

#[derive(Parser, Debug)]
#[command(name = "minidrive")]
#[command(about = "Multi-tenant file storage server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Config file path
        #[arg(default_value = "config.toml")]
        config: PathBuf,
    },

    /// Promote an existing account to administrator
    PromoteAdmin {
        /// Email of the account to promote
        email: String,

        /// Config file path
        #[arg(default_value = "config.toml")]
        config: PathBuf,
    },
}

impl Cli {
    /// The subcommand to run, `serve` with the default config when omitted.
    fn command(self) -> Commands {
        self.command.unwrap_or(Commands::Serve {
            config: PathBuf::from("config.toml"),
        })
    }
}

fn load_config(path: &Path) -> Config {
    match Config::load_with_env(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match Cli::parse().command() {
        Commands::Serve { config } => serve(load_config(&config)).await,
        Commands::PromoteAdmin { email, config } => {
            promote_admin(load_config(&config), &email).await
        }
    }
}

async fn serve(config: Config) -> ExitCode {
    // Initialize logging
    if let Err(e) = minidrive::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        minidrive::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!("minidrive - multi-tenant file storage");

    let db = match Database::open(&config.database.url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database: {e}");
            return ExitCode::FAILURE;
        }
    };

    let blobs = match minidrive::blob::from_config(&config.storage) {
        Ok(blobs) => blobs,
        Err(e) => {
            error!("Failed to initialize blob storage: {e}");
            return ExitCode::FAILURE;
        }
    };

    let server = match WebServer::new(&config, db, blobs) {
        Ok(server) => server,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    info!("Server configured on {}", server.addr());

    if let Err(e) = server.run().await {
        error!("Web server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn promote_admin(config: Config, email: &str) -> ExitCode {
    minidrive::logging::init_console_only(&config.logging.level);

    let db = match Database::open(&config.database.url).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database: {e}");
            return ExitCode::FAILURE;
        }
    };
    let repo = UserRepository::new(db.pool());

    let email = minidrive::auth::validation::normalize_email(email);
    let user = match repo.get_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            eprintln!("No user with email {email}. Registered users:");
            match repo.list_all().await {
                Ok(users) => {
                    for user in users {
                        eprintln!("  {} <{}> ({})", user.name, user.email, user.role);
                    }
                }
                Err(e) => eprintln!("Failed to list users: {e}"),
            }
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Failed to look up user: {e}");
            return ExitCode::FAILURE;
        }
    };

    if user.role == Role::Administrator {
        println!("{} is already an administrator", user.email);
        return ExitCode::SUCCESS;
    }

    match repo.update_role(user.id, Role::Administrator).await {
        Ok(Some(user)) => {
            println!("{} <{}> is now an administrator", user.name, user.email);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("User disappeared before the update");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Failed to update role: {e}");
            ExitCode::FAILURE
        }
    }
}
