use std::env;
use std::net::IpAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub jwt_cookie_expire_days: i64,
    pub production: bool,
    pub host: IpAddr,
    pub port: u16,
    pub max_reservations: i64,
    pub bcrypt_cost: u32,
}

impl Config {
    /// Reads the process environment; call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expire_hours: parsed("JWT_EXPIRE_HOURS", 24 * 30)?,
            jwt_cookie_expire_days: parsed("JWT_COOKIE_EXPIRE_DAYS", 30)?,
            production: env::var("APP_ENV").map(|v| v == "production").unwrap_or(false),
            host: parsed("HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parsed("PORT", 5000)?,
            max_reservations: parsed("MAX_RESERVATIONS", 3)?,
            bcrypt_cost: parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
