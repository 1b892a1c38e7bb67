//! Service Configuration
//! Mission: Collect every startup knob in one place, from flags or environment

use crate::auth::password::{MAX_COST, MIN_COST};
use anyhow::{bail, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the vendor API server
#[derive(Parser, Debug, Clone)]
#[command(name = "kiakart")]
#[command(about = "KiaKart Vendor Dashboard API")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8001")]
    pub bind: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "kiakart_vendor.db")]
    pub database_path: PathBuf,

    /// Directory uploaded product images are written to (served at /uploads)
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Secret used to sign new bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Previously used signing secrets still accepted for verification (comma-separated)
    #[arg(
        long,
        env = "JWT_PREVIOUS_SECRETS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub jwt_previous_secrets: Vec<String>,

    /// Bearer token lifetime in hours
    #[arg(long, env = "TOKEN_TTL_HOURS", default_value = "24")]
    pub token_ttl_hours: i64,

    /// bcrypt work factor for password hashes
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Maximum accepted request body size (multipart uploads included)
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "10485760")]
    pub max_body_bytes: usize,

    /// Requests per minute per client IP on the register/login routes
    #[arg(long, env = "AUTH_RATE_LIMIT_PER_MINUTE", default_value = "30")]
    pub auth_rate_limit: u32,
}

impl Config {
    /// Reject combinations that would start a broken or insecure server
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if self.jwt_secret.len() < 32 {
            tracing::warn!("JWT_SECRET is shorter than 32 characters");
        }
        if self.token_ttl_hours <= 0 {
            bail!("TOKEN_TTL_HOURS must be positive (got {})", self.token_ttl_hours);
        }
        if !(MIN_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            bail!(
                "BCRYPT_COST must be between {} and {} (got {})",
                MIN_COST,
                MAX_COST,
                self.bcrypt_cost
            );
        }
        if self.auth_rate_limit == 0 {
            bail!("AUTH_RATE_LIMIT_PER_MINUTE must be positive");
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }

    /// Previous secrets with blanks dropped (an empty env var parses as one empty entry)
    pub fn previous_secrets(&self) -> Vec<String> {
        self.jwt_previous_secrets
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(60)
    }
}
