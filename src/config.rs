// Application configuration loaded from the environment

use std::env;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_VNPAY_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";

/// Configuration errors raised at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// VNPay merchant settings
#[derive(Debug, Clone)]
pub struct VnPayConfig {
    pub tmn_code: String,
    pub hash_secret: String,
    pub base_url: String,
    pub return_url: String,
}

/// Rate limit applied to the public auth endpoints
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub per_second: u64,
    pub burst_size: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub appointment_sweep_interval_secs: u64,
    pub login_rate_limit: Option<RateLimitConfig>,
    pub vnpay: VnPayConfig,
    /// Username and password of an admin account created at startup
    pub bootstrap_admin: Option<(String, String)>,
}

impl AppConfig {
    /// Read configuration from environment variables.
    ///
    /// Call `dotenv::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        let login_rate_limit = match (
            optional::<u64>("LOGIN_RATE_LIMIT_PER_SECOND")?,
            optional::<u32>("LOGIN_RATE_LIMIT_BURST")?,
        ) {
            (Some(per_second), burst) => Some(RateLimitConfig {
                per_second,
                burst_size: burst.unwrap_or(5),
            }),
            (None, _) => None,
        };

        let bootstrap_admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.trim().is_empty() && !password.is_empty() => {
                Some((username.trim().to_string(), password))
            }
            _ => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: optional("DB_MAX_CONNECTIONS")?.unwrap_or(5),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: optional("PORT")?.unwrap_or(8080),
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl_secs: optional("ACCESS_TOKEN_TTL_SECS")?.unwrap_or(900),
            refresh_token_ttl_secs: optional("REFRESH_TOKEN_TTL_SECS")?.unwrap_or(604_800),
            appointment_sweep_interval_secs: positive("APPOINTMENT_SWEEP_INTERVAL_SECS")?
                .unwrap_or(60),
            login_rate_limit,
            vnpay: VnPayConfig {
                tmn_code: env::var("VNPAY_TMN_CODE").unwrap_or_default(),
                hash_secret: env::var("VNPAY_HASH_SECRET").unwrap_or_default(),
                base_url: env::var("VNPAY_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_VNPAY_URL.to_string()),
                return_url: env::var("VNPAY_RETURN_URL").unwrap_or_else(|_| {
                    "http://localhost:8080/api/payments/vnpay/return".to_string()
                }),
            },
            bootstrap_admin,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        _ => Ok(None),
    }
}

/// Like `optional`, but zero is rejected
fn positive(name: &'static str) -> Result<Option<u64>, ConfigError> {
    match optional::<u64>(name)? {
        Some(0) => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        }),
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-mutating tests use variable names nothing else reads.

    #[test]
    fn test_optional_parses_value() {
        env::set_var("EV_TEST_OPTIONAL_PORT", "9090");
        let port: Option<u16> = optional("EV_TEST_OPTIONAL_PORT").unwrap();
        assert_eq!(port, Some(9090));
    }

    #[test]
    fn test_optional_missing_is_none() {
        let value: Option<u32> = optional("EV_TEST_OPTIONAL_NEVER_SET").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_optional_rejects_garbage() {
        env::set_var("EV_TEST_OPTIONAL_GARBAGE", "not-a-number");
        let result: Result<Option<u16>, _> = optional("EV_TEST_OPTIONAL_GARBAGE");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_required_rejects_blank() {
        env::set_var("EV_TEST_REQUIRED_BLANK", "   ");
        assert!(matches!(
            required("EV_TEST_REQUIRED_BLANK"),
            Err(ConfigError::Missing("EV_TEST_REQUIRED_BLANK"))
        ));
    }

    #[test]
    fn test_positive_rejects_zero_interval() {
        env::set_var("EV_TEST_POSITIVE_ZERO", "0");
        assert!(matches!(
            positive("EV_TEST_POSITIVE_ZERO"),
            Err(ConfigError::Invalid { name: "EV_TEST_POSITIVE_ZERO", .. })
        ));
    }

    #[test]
    fn test_positive_accepts_interval() {
        env::set_var("EV_TEST_POSITIVE_THIRTY", "30");
        assert_eq!(positive("EV_TEST_POSITIVE_THIRTY").unwrap(), Some(30));
    }
}
