//! Gallery CLI - database migrations and administrator provisioning.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! gallery-cli migrate
//!
//! # Create (or promote) an administrator
//! gallery-cli admin create -e admin@example.com -n "Admin Name" --password '...'
//!
//! # Mint an admin bearer token
//! gallery-cli admin token --user-id 1
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create or promote an administrator account
//! - `admin token` - Print a signed admin token

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use gallery_core::UserId;

mod commands;

#[derive(Parser)]
#[command(name = "gallery-cli")]
#[command(author, version, about = "Gallery backend CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage administrators
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an administrator, or promote an existing account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin password (at least 6 characters)
        #[arg(long, env = "GALLERY_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print an admin bearer token for an account
    Token {
        /// ID of the account the token acts as
        #[arg(long)]
        user_id: i32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                let password = SecretString::from(password);
                commands::admin::create_user(&email, &name, &password).await?;
            }
            AdminAction::Token { user_id } => {
                let token = commands::admin::mint_token(UserId::new(user_id)).await?;
                // Only the token goes to stdout so it can be captured
                #[allow(clippy::print_stdout)]
                {
                    println!("{token}");
                }
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_admin_token() {
        let cli = Cli::try_parse_from(["gallery-cli", "admin", "token", "--user-id", "7"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Admin {
                action: AdminAction::Token { user_id: 7 }
            })
        ));
    }

    #[test]
    fn test_admin_create_requires_email() {
        let cli = Cli::try_parse_from([
            "gallery-cli",
            "admin",
            "create",
            "-n",
            "Admin",
            "--password",
            "hunter22",
        ]);
        assert!(cli.is_err());
    }
}
