use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use tracing::{info, warn};

/// Runtime settings read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub secure_cookies: bool,
    pub session_days: i64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: try_load("DATABASE_URL", "sqlite:data/booking.db"),
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000"),
            secure_cookies: try_load("SECURE_COOKIES", "false"),
            session_days: try_load("SESSION_DAYS", "14"),
        }
    }
}

impl Default for Config {
    /// The built-in defaults, ignoring the environment.
    fn default() -> Self {
        Self {
            database_url: parse_default("DATABASE_URL", "sqlite:data/booking.db"),
            bind_addr: parse_default("BIND_ADDR", "0.0.0.0:3000"),
            secure_cookies: false,
            session_days: 14,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        parse_default(key, default)
    })
}

fn parse_default<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    match default.parse() {
        Ok(value) => value,
        Err(e) => panic!("default for {key} does not parse: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_uses_default() {
        let port: u16 = try_load("ATBOOKING_TEST_UNSET_VARIABLE", "3000");
        assert_eq!(port, 3000);
    }

    #[test]
    fn defaults_parse() {
        let addr: SocketAddr = parse_default("BIND_ADDR", "0.0.0.0:3000");
        assert_eq!(addr.port(), 3000);
        let secure: bool = parse_default("SECURE_COOKIES", "false");
        assert!(!secure);
    }
}
