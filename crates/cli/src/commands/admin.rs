//! Administrator provisioning commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an administrator, or promote an existing account
//! GALLERY_ADMIN_PASSWORD=... gallery-cli admin create -e admin@example.com -n "Gallery Admin"
//!
//! # Mint a break-glass admin token for user 1
//! gallery-cli admin token --user-id 1
//! ```
//!
//! # Environment Variables
//!
//! - `GALLERY_DATABASE_URL` (or `DATABASE_URL`) - for both commands
//! - `GALLERY_JWT_SECRET`, `GALLERY_TOKEN_TTL_HOURS` - for `token`, must
//!   match the server's

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

use gallery_core::{Role, UserId};
use gallery_server::config::{AuthConfig, ConfigError, database_url_from_env};
use gallery_server::db::RepositoryError;
use gallery_server::db::users::UserRepository;
use gallery_server::services::auth::{AuthError, AuthService, CredentialError, Registration, TokenKeys};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not provision admin: {0}")]
    Auth(#[from] AuthError),

    #[error("Could not mint token: {0}")]
    Token(#[from] CredentialError),

    #[error("Could not look up user: {0}")]
    Repository(#[from] RepositoryError),

    #[error("No user with ID {0}")]
    UnknownUser(UserId),
}

/// Create an administrator account, or promote and reset an existing one.
///
/// # Returns
///
/// The ID of the administrator.
///
/// # Errors
///
/// Returns `AdminError` if configuration is missing, the form is invalid,
/// or the database write fails.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &SecretString,
) -> Result<UserId, AdminError> {
    dotenvy::dotenv().ok();
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let user = AuthService::new(&pool)
        .provision_admin(Registration {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.expose_secret().to_owned(),
            ..Registration::default()
        })
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Administrator ready");
    Ok(user.id)
}

/// Mint an admin token for `user_id`, signed with the server's secret.
///
/// The account must exist. The token carries the admin role whatever the
/// stored account says.
///
/// # Errors
///
/// Returns `AdminError` if the secret is missing or weak, the user does not
/// exist, or signing fails.
pub async fn mint_token(user_id: UserId) -> Result<String, AdminError> {
    dotenvy::dotenv().ok();
    let auth = AuthConfig::from_env()?;
    let database_url = database_url_from_env()?;

    let pool = PgPool::connect(database_url.expose_secret()).await?;
    UserRepository::new(&pool)
        .get_by_id(user_id)
        .await?
        .ok_or(AdminError::UnknownUser(user_id))?;

    let keys = TokenKeys::new(&auth.jwt_secret, auth.token_ttl_hours);
    let token = keys.issue(user_id, Role::Admin)?;

    tracing::info!(user_id = %user_id, ttl_hours = auth.token_ttl_hours, "Admin token minted");
    Ok(token)
}
