//! Configuration management for the FarmLink server.
//!
//! Loads configuration from environment variables (a `.env` file is read
//! first when present) with sensible defaults. Secrets are optional at load
//! time; [`Config::validate`] rejects half-configured integrations.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const REDACTED: &str = "[REDACTED]";

/// Configuration could not be loaded or is inconsistent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// One variable of a group is set without its partner
    #[error("{set} is set but {missing} is not")]
    Incomplete {
        /// Variable that is present
        set: &'static str,
        /// Variable that is required alongside it
        missing: &'static str,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PostgreSQL` configuration
    pub database: DatabaseConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Payment gateway configuration
    pub payment: PaymentConfig,
    /// Forecast provider configuration
    pub weather: WeatherConfig,
    /// Zoom meeting provider configuration
    pub zoom: ZoomConfig,
    /// Google Calendar meeting provider configuration
    pub google: GoogleConfig,
    /// Outbound email configuration
    pub email: EmailConfig,
    /// Timeout in seconds applied to every outbound HTTP client
    pub http_timeout: u64,
    /// Background confirmation configuration
    pub confirmation: ConfirmationConfig,
}

/// `PostgreSQL` configuration
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Connection URL
    pub url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // URLs usually embed a password.
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| REDACTED))
            .field("max_connections", &self.max_connections)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Razorpay-compatible gateway configuration
#[derive(Clone)]
pub struct PaymentConfig {
    /// Public key id
    pub key_id: Option<String>,
    /// API key secret
    pub key_secret: Option<String>,
    /// Webhook signing secret
    pub webhook_secret: Option<String>,
    /// Gateway REST base URL
    pub api_url: String,
    /// ISO 4217 currency for new orders
    pub currency: String,
}

impl fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &self.key_secret.as_ref().map(|_| REDACTED))
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| REDACTED))
            .field("api_url", &self.api_url)
            .field("currency", &self.currency)
            .finish()
    }
}

/// Forecast provider configuration
#[derive(Clone)]
pub struct WeatherConfig {
    /// `OpenWeather` API key
    pub api_key: Option<String>,
    /// Forecast endpoint
    pub api_url: String,
}

impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Zoom server-to-server OAuth configuration
#[derive(Clone, Default)]
pub struct ZoomConfig {
    /// Account id
    pub account_id: Option<String>,
    /// OAuth client id
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
}

impl fmt::Debug for ZoomConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoomConfig")
            .field("account_id", &self.account_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// Google Calendar configuration
#[derive(Clone)]
pub struct GoogleConfig {
    /// OAuth access token with calendar scope
    pub access_token: Option<String>,
    /// Calendar that receives the events
    pub calendar_id: String,
}

impl fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| REDACTED))
            .field("calendar_id", &self.calendar_id)
            .finish()
    }
}

/// SMTP configuration. Without a server, emails are logged instead.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay host
    pub smtp_server: Option<String>,
    /// SMTP relay port
    pub smtp_port: u16,
    /// SMTP login
    pub smtp_username: Option<String>,
    /// SMTP password
    pub smtp_password: Option<String>,
    /// Sender address
    pub from_email: Option<String>,
    /// Sender display name
    pub from_name: String,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| REDACTED))
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// Background confirmation configuration
#[derive(Debug, Clone)]
pub struct ConfirmationConfig {
    /// Retries after the first attempt, per confirmation run
    pub max_retries: usize,
    /// Seconds between sweeps for bookings stuck in `paid`
    pub sweep_interval: u64,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database: DatabaseConfig {
                url: var("DATABASE_URL"),
                max_connections: parse_or(var("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
                connect_timeout: parse_or(var("DATABASE_CONNECT_TIMEOUT"), "DATABASE_CONNECT_TIMEOUT", 30)?,
            },
            server: ServerConfig {
                host: or("HOST", "0.0.0.0"),
                port: parse_or(var("PORT"), "PORT", 8000)?,
                shutdown_timeout: parse_or(var("SHUTDOWN_TIMEOUT"), "SHUTDOWN_TIMEOUT", 30)?,
            },
            payment: PaymentConfig {
                key_id: var("RAZORPAY_KEY_ID"),
                key_secret: var("RAZORPAY_KEY_SECRET"),
                webhook_secret: var("RAZORPAY_WEBHOOK_SECRET"),
                api_url: or("RAZORPAY_API_URL", farmlink_providers::razorpay::DEFAULT_API_URL),
                currency: or("PAYMENT_CURRENCY", "INR").to_uppercase(),
            },
            weather: WeatherConfig {
                api_key: var("OPENWEATHER_API_KEY"),
                api_url: or("OPENWEATHER_API_URL", farmlink_providers::openweather::DEFAULT_API_URL),
            },
            zoom: ZoomConfig {
                account_id: var("ZOOM_ACCOUNT_ID"),
                client_id: var("ZOOM_CLIENT_ID"),
                client_secret: var("ZOOM_CLIENT_SECRET"),
            },
            google: GoogleConfig {
                access_token: var("GOOGLE_CALENDAR_ACCESS_TOKEN"),
                calendar_id: or("GOOGLE_CALENDAR_ID", "primary"),
            },
            email: EmailConfig {
                smtp_server: var("SMTP_SERVER"),
                smtp_port: parse_or(var("SMTP_PORT"), "SMTP_PORT", 587)?,
                smtp_username: var("SMTP_USERNAME"),
                smtp_password: var("SMTP_PASSWORD"),
                from_email: var("EMAIL_FROM"),
                from_name: or("EMAIL_FROM_NAME", "FarmLink"),
            },
            http_timeout: parse_or(var("HTTP_TIMEOUT"), "HTTP_TIMEOUT", 10)?,
            confirmation: ConfirmationConfig {
                max_retries: parse_or(var("CONFIRMATION_MAX_RETRIES"), "CONFIRMATION_MAX_RETRIES", 5)?,
                sweep_interval: parse_or(
                    var("CONFIRMATION_SWEEP_INTERVAL"),
                    "CONFIRMATION_SWEEP_INTERVAL",
                    60,
                )?,
            },
        })
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] without `DATABASE_URL`, or `EMAIL_FROM` when SMTP is on
    /// - [`ConfigError::Incomplete`] for a partial credential pair or triple
    /// - [`ConfigError::Invalid`] for zero timeouts, intervals or pool sizes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("DATABASE_MAX_CONNECTIONS", "must be at least 1"));
        }
        if self.http_timeout == 0 {
            return Err(invalid("HTTP_TIMEOUT", "must be at least 1 second"));
        }
        if self.confirmation.sweep_interval == 0 {
            return Err(invalid("CONFIRMATION_SWEEP_INTERVAL", "must be at least 1 second"));
        }
        if self.payment.currency.len() != 3 || !self.payment.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid("PAYMENT_CURRENCY", "expected a three-letter ISO 4217 code"));
        }

        pair(
            ("RAZORPAY_KEY_ID", self.payment.key_id.as_ref()),
            ("RAZORPAY_KEY_SECRET", self.payment.key_secret.as_ref()),
        )?;

        let zoom = [
            ("ZOOM_ACCOUNT_ID", self.zoom.account_id.as_ref()),
            ("ZOOM_CLIENT_ID", self.zoom.client_id.as_ref()),
            ("ZOOM_CLIENT_SECRET", self.zoom.client_secret.as_ref()),
        ];
        if let Some(&(set, _)) = zoom.iter().find(|(_, v)| v.is_some()) {
            if let Some(&(missing, _)) = zoom.iter().find(|(_, v)| v.is_none()) {
                return Err(ConfigError::Incomplete { set, missing });
            }
        }

        pair(
            ("SMTP_USERNAME", self.email.smtp_username.as_ref()),
            ("SMTP_PASSWORD", self.email.smtp_password.as_ref()),
        )?;
        if self.email.smtp_server.is_some() && self.email.from_email.is_none() {
            return Err(ConfigError::Missing("EMAIL_FROM"));
        }

        Ok(())
    }

    /// Outbound HTTP timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    /// Address the HTTP listener binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.map_or(Ok(default), |raw| raw.parse().map_err(|e: T::Err| invalid(key, e.to_string())))
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

fn pair(
    (first, a): (&'static str, Option<&String>),
    (second, b): (&'static str, Option<&String>),
) -> Result<(), ConfigError> {
    match (a, b) {
        (Some(_), None) => Err(ConfigError::Incomplete { set: first, missing: second }),
        (None, Some(_)) => Err(ConfigError::Incomplete { set: second, missing: first }),
        _ => Ok(()),
    }
}
