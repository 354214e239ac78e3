use crate::constants::*;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SESSION_SECRET is required")]
    MissingSessionSecret,

    #[error("SESSION_SECRET must be at least {MIN_SESSION_SECRET_LENGTH} bytes long")]
    SessionSecretTooShort,

    #[error("PORT must be a number between 1 and 65535, got '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_path: String,
    pub session_secret: String,
    pub production: bool,
    pub frontend_origin: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let session_secret = lookup("SESSION_SECRET").ok_or(ConfigError::MissingSessionSecret)?;
        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(ConfigError::SessionSecretTooShort);
        }

        let port = lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        let port = match port.trim().parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => return Err(ConfigError::InvalidPort(port)),
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_path: lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string()),
            session_secret,
            production: lookup("PRODUCTION")
                .map(|val| val.to_lowercase() == "true")
                .unwrap_or(false),
            frontend_origin: lookup("FRONTEND_ORIGIN")
                .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
