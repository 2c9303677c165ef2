use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::MailConfig;
use crate::error::Error;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), Error>;
}

/// Sends mail through an HTTP email API that accepts `{from, to, subject, html}`
/// with a bearer key.
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> HttpMailer {
        HttpMailer {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[derive(Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

#[async_trait]
impl Mailer for HttpMailer {
    #[tracing::instrument(skip(self, link))]
    async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), Error> {
        let mail = OutgoingMail {
            from: &self.config.from,
            to: [to],
            subject: "Reset your BlookMySpace password",
            html: format!(
                "<p>We received a request to reset your password.</p>\
                 <p><a href=\"{0}\">Reset password</a></p>\
                 <p>This link expires in 1 hour. If you did not ask for a reset you can ignore this email.</p>",
                link
            ),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&mail)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::UpstreamRejected {
                service: "mail",
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

/// Used when no mail API is configured; the link only goes to the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), Error> {
        info!("password reset for {}: {}", to, link);

        Ok(())
    }
}

pub fn from_config(config: Option<MailConfig>) -> Box<dyn Mailer> {
    match config {
        Some(config) => Box::new(HttpMailer::new(config)),
        None => Box::new(LogMailer),
    }
}
