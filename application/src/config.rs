//! [`Config`]-related definitions.

use std::{path::PathBuf, time};

use clap::ValueEnum;
use common::Currency;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::SecretString;
use serde::Deserialize;
use service::infra::{notification, payment, storage};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Razorpay configuration.
    pub razorpay: Razorpay,

    /// Brevo e-mail configuration.
    ///
    /// E-mails are not sent if omitted.
    pub brevo: Option<Brevo>,

    /// Twilio WhatsApp configuration.
    ///
    /// WhatsApp messages are not sent if omitted.
    pub twilio: Option<Twilio>,

    /// Storage configuration.
    pub storage: Storage,

    /// Authentication configuration.
    pub auth: Auth,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [`Currency`] lands are leased for.
    #[default(Currency::Inr)]
    pub currency: Currency,

    /// Maximum duration of a single payment gateway call.
    #[default(time::Duration::from_secs(10))]
    #[serde(with = "humantime_serde")]
    pub payment_timeout: time::Duration,

    /// Maximum duration of a single notification delivery attempt.
    #[default(time::Duration::from_secs(10))]
    #[serde(with = "humantime_serde")]
    pub notification_timeout: time::Duration,

    /// Delay before retrying a failed notification delivery.
    #[default(time::Duration::from_secs(1))]
    #[serde(with = "humantime_serde")]
    pub notification_retry_delay: time::Duration,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            currency,
            payment_timeout,
            notification_timeout,
            notification_retry_delay,
        } = value;

        Self {
            currency,
            payment_timeout,
            notification_timeout,
            notification_retry_delay,
        }
    }
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// [Razorpay] configuration.
///
/// [Razorpay]: https://razorpay.com
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Razorpay {
    /// Base URL of the API.
    #[default("https://api.razorpay.com".to_owned())]
    pub api_url: String,

    /// Key ID of the account.
    pub key_id: String,

    /// Key secret of the account.
    #[default(SecretString::from(String::new()))]
    pub key_secret: SecretString,

    /// Secret the webhooks are signed with.
    #[default(SecretString::from(String::new()))]
    pub webhook_secret: SecretString,
}

impl From<Razorpay> for payment::razorpay::Config {
    fn from(value: Razorpay) -> Self {
        let Razorpay {
            api_url,
            key_id,
            key_secret,
            webhook_secret,
        } = value;

        Self {
            api_url,
            key_id,
            key_secret,
            webhook_secret,
        }
    }
}

/// [Brevo] configuration.
///
/// [Brevo]: https://brevo.com
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Brevo {
    /// Base URL of the API.
    #[default("https://api.brevo.com".to_owned())]
    pub api_url: String,

    /// API key of the account.
    #[default(SecretString::from(String::new()))]
    pub api_key: SecretString,

    /// Name to send e-mails on behalf of.
    #[default("Farm Lease".to_owned())]
    pub sender_name: String,

    /// Address to send e-mails from.
    pub sender_email: String,
}

impl From<Brevo> for notification::brevo::Config {
    fn from(value: Brevo) -> Self {
        let Brevo {
            api_url,
            api_key,
            sender_name,
            sender_email,
        } = value;

        Self {
            api_url,
            api_key,
            sender_name,
            sender_email,
        }
    }
}

/// [Twilio] configuration.
///
/// [Twilio]: https://twilio.com
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Twilio {
    /// Base URL of the API.
    #[default("https://api.twilio.com".to_owned())]
    pub api_url: String,

    /// SID of the account.
    pub account_sid: String,

    /// Authentication token of the account.
    #[default(SecretString::from(String::new()))]
    pub auth_token: SecretString,

    /// WhatsApp number to send messages from.
    pub from: String,

    /// Country code prepended to numbers without one.
    #[default("91".to_owned())]
    pub default_country_code: String,
}

impl From<Twilio> for notification::twilio::Config {
    fn from(value: Twilio) -> Self {
        let Twilio {
            api_url,
            account_sid,
            auth_token,
            from,
            default_country_code,
        } = value;

        Self {
            api_url,
            account_sid,
            auth_token,
            from,
            default_country_code,
        }
    }
}

/// Storage configuration of uploaded images and generated documents.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Storage {
    /// Directory to store files in.
    #[default(PathBuf::from("files"))]
    pub root: PathBuf,

    /// Public URL the stored files are served under.
    #[default("http://127.0.0.1:8080/files".to_owned())]
    pub public_url: String,
}

impl From<Storage> for storage::fs::Config {
    fn from(value: Storage) -> Self {
        let Storage { root, public_url } = value;
        Self { root, public_url }
    }
}

/// Authentication configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Auth {
    /// Secret the [JWT] bearer tokens are signed with.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default(SecretString::from("secret".to_owned()))]
    pub jwt_secret: SecretString,
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::Currency;
    use secrecy::ExposeSecret as _;

    use super::Config;

    #[test]
    fn defaults_without_sources() {
        let config = Config::new("definitely-missing.toml").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.service.currency, Currency::Inr);
        assert_eq!(config.service.payment_timeout, Duration::from_secs(10));
        assert!(config.brevo.is_none());
        assert!(config.twilio.is_none());
        assert_eq!(config.auth.jwt_secret.expose_secret(), "secret");
    }
}
