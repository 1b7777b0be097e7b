use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

mod commands;
mod logging;

use commands::{health, key, serve, users};

/// Drive CLI - Run and administer the file drive server
#[derive(Parser)]
#[command(name = "drive")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, env = "DRIVE_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "DRIVE_PORT", default_value_t = 3030)]
        port: u16,

        /// SQLite database file
        #[arg(long, env = "DRIVE_DATABASE", default_value = "data/drive.db")]
        database: PathBuf,

        /// Directory holding uploaded file bytes
        #[arg(long, env = "FILES_ROOT", default_value = "data/files")]
        files_root: PathBuf,

        /// Directory for daily log files
        #[arg(long, env = "DRIVE_LOG_DIR", default_value = "data/logs")]
        log_dir: PathBuf,

        /// Keep everything in memory instead of SQLite
        #[arg(long)]
        memory: bool,

        /// Create an `admin` account with this password if it does not exist
        #[arg(long, env = "DRIVE_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,
    },

    /// Check the local deployment
    Health {
        /// SQLite database file
        #[arg(long, env = "DRIVE_DATABASE", default_value = "data/drive.db")]
        database: PathBuf,

        /// Directory holding uploaded file bytes
        #[arg(long, env = "FILES_ROOT", default_value = "data/files")]
        files_root: PathBuf,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// User management commands
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Capability key commands
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Add {
        /// Login name
        name: String,

        /// Login password
        #[arg(long, env = "DRIVE_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Role; `admin` may create at the drive root
        #[arg(long, default_value = "editor")]
        role: String,

        /// Permission grant such as `read:all` or `delete:own-all` (repeatable)
        #[arg(long = "permission", short = 'g')]
        permissions: Vec<String>,

        /// SQLite database file
        #[arg(long, env = "DRIVE_DATABASE", default_value = "data/drive.db")]
        database: PathBuf,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Derive a capability key for a user id
    Derive {
        user_id: String,

        /// Random bytes in the key
        #[arg(short, long, default_value_t = user::DEFAULT_KEY_BYTES)]
        length: usize,
    },

    /// Verify a capability key against a user id
    Verify { key: String, user_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Flags may come from .env, so load it before parsing
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };

    let outcome = match cli.command {
        Commands::Serve {
            host,
            port,
            database,
            files_root,
            log_dir,
            memory,
            admin_password,
        } => {
            let _guard = logging::init_logging(&log_dir, log_level)?;
            let result = serve::execute(serve::ServeOptions {
                host,
                port,
                database,
                files_root,
                memory,
                admin_password,
            })
            .await;
            tracing::info!("Server shut down");
            result
        }
        Commands::Health {
            database,
            files_root,
            format,
        } => {
            logging::init_console_logging("warn");
            health::execute(&database, &files_root, format).await
        }
        Commands::User { action } => {
            logging::init_console_logging(log_level);
            match action {
                UserAction::Add {
                    name,
                    password,
                    role,
                    permissions,
                    database,
                } => users::add(database, name, password, role, permissions).await,
            }
        }
        Commands::Key { action } => {
            logging::init_console_logging("warn");
            match action {
                KeyAction::Derive { user_id, length } => key::derive(user_id, length),
                KeyAction::Verify { key, user_id } => key::verify(key, user_id),
            }
        }
    };

    if let Err(e) = outcome {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
