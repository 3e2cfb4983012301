//! Admin tool configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use league_standings::{db::DatabaseConfig, standings::ScoringRules};

/// Complete tool configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Point values used when recomputing
    pub scoring: ScoringRules,
}

impl AdminConfig {
    /// Load configuration from environment variables
    ///
    /// `database_url_override` comes from `--db-url` and wins over
    /// `DATABASE_URL`.
    pub fn from_env(database_url_override: Option<String>) -> Self {
        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        Self {
            database,
            scoring: ScoringRules::from_env(),
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.database.database_url.starts_with("postgres://")
            && !self.database.database_url.starts_with("postgresql://")
        {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL".to_string(),
                reason: "Must be a postgres:// connection string".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        for (var, value) in [
            ("SCORING_SET_POINTS_PER_SET", self.scoring.set_points_per_set),
            ("SCORING_MID_BONUS", self.scoring.mid_bonus),
            ("SCORING_ALL_BONUS", self.scoring.all_bonus),
        ] {
            if value < 0 {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: format!("Must not be negative, got {value}"),
                });
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AdminConfig {
        AdminConfig {
            database: DatabaseConfig {
                database_url: "postgres://localhost/league_test".to_string(),
                max_connections: 10,
                min_connections: 1,
                connection_timeout_secs: 5,
                idle_timeout_secs: 300,
                max_lifetime_secs: 1800,
            },
            scoring: ScoringRules::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_override_wins() {
        let config = AdminConfig::from_env(Some("postgres://override/db".to_string()));
        assert_eq!(config.database.database_url, "postgres://override/db");
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = valid_config();
        config.database.database_url = "mysql://localhost/db".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_config_validation_pool_bounds() {
        let mut config = valid_config();
        config.database.min_connections = 20;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_MIN_CONNECTIONS"));
    }

    #[test]
    fn test_config_validation_negative_bonus() {
        let mut config = valid_config();
        config.scoring.mid_bonus = -2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SCORING_MID_BONUS"));
    }
}
