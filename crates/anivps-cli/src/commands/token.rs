//! Development bearer tokens.

use clap::Args;
use uuid::Uuid;

use anivps_auth::JwtEncoder;
use anivps_core::config::AppConfig;
use anivps_core::error::AppError;
use anivps_entity::user::UserRole;

use crate::output;

/// Arguments for the token command
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Subject of the token; a random id when omitted
    #[arg(long)]
    pub user: Option<Uuid>,
    /// `user`, `admin` or `super_admin`
    #[arg(long, default_value = "user")]
    pub role: String,
    /// Email claim
    #[arg(long)]
    pub email: Option<String>,
    /// Lifetime in minutes (defaults to `auth.issued_token_ttl_minutes`)
    #[arg(long)]
    pub ttl_minutes: Option<i64>,
}

/// Sign a token with the configured secret
pub fn execute(args: &TokenArgs, config: &AppConfig) -> Result<(), AppError> {
    let role: UserRole = args.role.parse()?;
    let user_id = args.user.unwrap_or_else(Uuid::new_v4);

    let mut encoder = JwtEncoder::new(&config.auth);
    if let Some(ttl) = args.ttl_minutes {
        encoder = encoder.with_ttl_minutes(ttl);
    }
    let token = encoder.issue(user_id, role, args.email.as_deref())?;

    output::print_kv("User", &user_id.to_string());
    output::print_kv("Role", &role.to_string());
    println!("{token}");
    Ok(())
}
