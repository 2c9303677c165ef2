use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use tracing::Level;

use crate::error::Error;

/// Server settings, read from the environment after loading any `.env` file.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: String,
    pub mongodb_uri: String,
    pub database_name: String,
    pub log_level: Level,
    /// Base of the links put into password reset emails.
    pub public_base_url: String,
    pub payment: Option<PaymentConfig>,
    pub mail: Option<MailConfig>,
    pub seed_demo_data: bool,
}

#[derive(Clone)]
pub struct PaymentConfig {
    pub api_url: String,
    pub key_id: String,
    pub key_secret: String,
}

impl Debug for PaymentConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("api_url", &self.api_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

impl Debug for MailConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Config, Error> {
        // a missing .env file is fine, the variables may come from the process
        let _ = dotenvy::dotenv();

        Config::from_lookup(|key| dotenvy::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let payment = match (var("PAYMENT_KEY_ID"), var("PAYMENT_KEY_SECRET")) {
            (Some(key_id), Some(key_secret)) => Some(PaymentConfig {
                api_url: var("PAYMENT_API_URL")
                    .unwrap_or_else(|| "https://api.razorpay.com/v1".to_string()),
                key_id,
                key_secret,
            }),
            _ => None,
        };

        let mail = match (var("MAIL_API_URL"), var("MAIL_API_KEY"), var("MAIL_FROM")) {
            (Some(api_url), Some(api_key), Some(from)) => Some(MailConfig {
                api_url,
                api_key,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            bind_address: var("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            mongodb_uri: var("MONGODB_URI")
                .unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            database_name: var("DATABASE_NAME").unwrap_or_else(|| "blookmyspace".to_string()),
            log_level: parse_or("LOG_LEVEL", var("LOG_LEVEL"), Level::DEBUG)?,
            public_base_url: var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            payment,
            mail,
            seed_demo_data: parse_or("SEED_DEMO_DATA", var("SEED_DEMO_DATA"), false)?,
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, value: Option<String>, default: T) -> Result<T, Error> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::InvalidConfig { key, value }),
        None => Ok(default),
    }
}
