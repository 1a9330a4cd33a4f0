use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, bail};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => bail!("unknown environment {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        Ok(Self {
            database_url,
            port: parse_or(&lookup, "PORT", 3001)?,
            max_connections: parse_or(&lookup, "MAX_CONNECTIONS", 5)?,
            environment: parse_or(&lookup, "APP_ENV", Environment::Development)?,
        })
    }

    /// In production every request arrives through the proxy, so a loopback
    /// client address means the forwarded header was missing.
    pub fn reject_loopback(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key} value {raw:?}: {e}")),
        None => {
            info!("{key} not set, using default: {default:?}");
            Ok(default)
        }
    }
}
