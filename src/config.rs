//! Process configuration: command-line flags with environment fallbacks.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "bytebros", version, about = "ByteBros catalog and support API")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind_addr: String,

    /// SQLite database file
    #[arg(long, env = "DB_PATH", default_value = "bytebros.db")]
    pub db_path: String,

    /// HMAC secret used to sign and verify access tokens
    #[arg(long, env = "JWT_SECRET", default_value = "", hide_env_values = true)]
    pub jwt_secret: String,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST,
          value_parser = clap::value_parser!(u32).range(4..=31))]
    pub bcrypt_cost: u32,

    /// Administrator created on startup when none exists
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    #[arg(long, env = "ADMIN_NAME", default_value = "Administrador")]
    pub admin_name: String,
}

impl Config {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Bootstrap credentials, only when both halves are present.
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (self.admin_email.as_deref(), self.admin_password.as_deref()) {
            (Some(email), Some(password)) if !email.trim().is_empty() => Some((email, password)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_args() {
        let config = Config::try_parse_from(["bytebros", "--jwt-secret", "s3cret"]).unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.listen_addr().ends_with(":8080") || std::env::var("PORT").is_ok());
    }

    #[test]
    fn test_bcrypt_cost_range_enforced() {
        let result = Config::try_parse_from(["bytebros", "--bcrypt-cost", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bootstrap_admin_requires_both_values() {
        let config = Config::try_parse_from([
            "bytebros",
            "--admin-email",
            "root@bytebros.dev",
            "--admin-password",
            "changeme",
        ])
        .unwrap();
        assert_eq!(
            config.bootstrap_admin(),
            Some(("root@bytebros.dev", "changeme"))
        );

        let config = Config::try_parse_from(["bytebros", "--admin-email", "root@bytebros.dev"])
            .unwrap();
        if std::env::var("ADMIN_PASSWORD").is_err() {
            assert!(config.bootstrap_admin().is_none());
        }
    }
}
