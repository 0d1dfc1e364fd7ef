//! Environment-driven service configuration.

/// Runtime configuration, collected once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the server binds to.
    pub bind_addr: String,
    /// Seed tokens for the in-memory identity provider, when set:
    /// `token:role:uuid` triples separated by commas, role `shipper` or
    /// `carrier`. Production deployments plug a real identity provider in
    /// instead.
    pub auth_seed: Option<String>,
    /// Postgres connection string; `None` runs in-memory only.
    pub database_url: Option<String>,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// `CARTAGE_BIND_ADDR` defaults to `0.0.0.0:8080`; `CARTAGE_AUTH_SEED`
    /// and `DATABASE_URL` are optional.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("CARTAGE_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            auth_seed: std::env::var("CARTAGE_AUTH_SEED").ok(),
            database_url: std::env::var("DATABASE_URL").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        // Construct directly rather than mutating process env in tests.
        let config = Config {
            bind_addr: "0.0.0.0:8080".to_string(),
            auth_seed: None,
            database_url: None,
        };
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.database_url.is_none());
    }
}
