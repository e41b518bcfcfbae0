use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_parse_or};
use database::RetryConfig;

/// Bounds for a single cart unit of work
#[derive(Clone, Debug)]
pub struct ReservationConfig {
    /// Wall-clock budget for one operation, retries included
    pub timeout: Duration,
    /// Retries after a lost race (unique violation, deadlock, serialization failure)
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt
    pub retry_delay: Duration,
}

impl ReservationConfig {
    pub fn new(timeout: Duration, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            timeout,
            max_retries,
            retry_delay,
        }
    }

    pub(crate) fn retry_policy(&self) -> RetryConfig {
        let initial = self.retry_delay.as_millis() as u64;
        RetryConfig::new()
            .with_max_retries(self.max_retries)
            .with_initial_delay(initial)
            .with_max_delay(initial.saturating_mul(8).max(1))
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000), 3, Duration::from_millis(20))
    }
}

impl FromEnv for ReservationConfig {
    /// - CART_TX_TIMEOUT_MS: defaults to 5000
    /// - CART_TX_MAX_RETRIES: defaults to 3
    /// - CART_TX_RETRY_DELAY_MS: defaults to 20
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_ms = env_parse_or("CART_TX_TIMEOUT_MS", 5000u64)?;
        let max_retries = env_parse_or("CART_TX_MAX_RETRIES", 3u32)?;
        let retry_delay_ms = env_parse_or("CART_TX_RETRY_DELAY_MS", 20u64)?;

        if timeout_ms == 0 {
            return Err(ConfigError::ParseError {
                key: "CART_TX_TIMEOUT_MS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(Self::new(
            Duration::from_millis(timeout_ms),
            max_retries,
            Duration::from_millis(retry_delay_ms),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_config_defaults() {
        temp_env::with_vars(
            [
                ("CART_TX_TIMEOUT_MS", None::<&str>),
                ("CART_TX_MAX_RETRIES", None::<&str>),
                ("CART_TX_RETRY_DELAY_MS", None::<&str>),
            ],
            || {
                let config = ReservationConfig::from_env().unwrap();
                assert_eq!(config.timeout, Duration::from_secs(5));
                assert_eq!(config.max_retries, 3);
                assert_eq!(config.retry_delay, Duration::from_millis(20));
            },
        );
    }

    #[test]
    fn test_reservation_config_custom_values() {
        temp_env::with_vars(
            [
                ("CART_TX_TIMEOUT_MS", Some("250")),
                ("CART_TX_MAX_RETRIES", Some("0")),
                ("CART_TX_RETRY_DELAY_MS", Some("5")),
            ],
            || {
                let config = ReservationConfig::from_env().unwrap();
                assert_eq!(config.timeout, Duration::from_millis(250));
                assert_eq!(config.max_retries, 0);
                assert_eq!(config.retry_policy().max_retries, 0);
            },
        );
    }

    #[test]
    fn test_reservation_config_rejects_bad_values() {
        temp_env::with_var("CART_TX_TIMEOUT_MS", Some("soon"), || {
            assert!(ReservationConfig::from_env().is_err());
        });
        temp_env::with_var("CART_TX_TIMEOUT_MS", Some("0"), || {
            assert!(ReservationConfig::from_env().is_err());
        });
    }
}
