use serde::Deserialize;

use crate::engine::{ClipPolicy, WeekPolicy};
use crate::models::ValueSchema;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub engine: EngineConfig,
    pub user: UserConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub sentinel_enabled: bool,
    pub sentinel_url: Option<String>,
}

/// Engine knobs: active value schema, weekly capacity, week labeling,
/// clipping policy, and the forecast horizon. Deployments differ only here,
/// never in code paths.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub value_schema: SchemaKind,
    pub weekly_capacity: f64,
    pub week_policy: WeekPolicy,
    pub clip_policy: ClipPolicy,
    pub forecast_horizon: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Hours,
    Percentage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    /// Usernames granted the admin role at registration.
    pub admin_usernames: Vec<String>,
}

impl EngineConfig {
    pub fn value_schema(&self) -> ValueSchema {
        match self.value_schema {
            SchemaKind::Hours => ValueSchema::Hours {
                weekly_capacity: self.weekly_capacity,
            },
            SchemaKind::Percentage => ValueSchema::Percentage,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::Environment::with_prefix("APP"))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()
    }

    /// Rejects settings that would poison downstream arithmetic. The weekly
    /// capacity is a divisor in every utilization percentage.
    fn validate(self) -> Result<Self, config::ConfigError> {
        if !(self.engine.weekly_capacity.is_finite() && self.engine.weekly_capacity > 0.0) {
            return Err(config::ConfigError::Message(format!(
                "engine.weekly_capacity must be a positive number, got {}",
                self.engine.weekly_capacity
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            redis: RedisConfig {
                url: "redis://127.0.0.1:6379".to_string(),
                sentinel_enabled: false,
                sentinel_url: None,
            },
            engine: EngineConfig {
                value_schema: SchemaKind::Hours,
                weekly_capacity: 40.0,
                week_policy: WeekPolicy::IsoWeekStart,
                clip_policy: ClipPolicy::None,
                forecast_horizon: 4,
            },
            user: UserConfig {
                admin_usernames: vec!["ariel".to_string()],
            },
        }
    }

    #[test]
    fn positive_capacity_passes_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn non_positive_capacity_is_rejected() {
        for bad in [0.0, -40.0, f64::NAN, f64::INFINITY] {
            let mut config = base_config();
            config.engine.weekly_capacity = bad;
            assert!(config.validate().is_err(), "capacity {} must be rejected", bad);
        }
    }
}

