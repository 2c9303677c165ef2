use chrono::{DateTime, Duration, Utc};
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::typedid::{TypedId, TypedIdMarker};
use crate::user::UserId;

pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type PasswordResetId = TypedId<PasswordReset>;

const TOKEN_BYTES: usize = 32;

pub fn token_lifetime() -> Duration {
    Duration::hours(1)
}

/// A single-use password reset. Only the hash of the token is stored.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PasswordReset {
    #[serde(rename = "_id")]
    pub id: PasswordResetId,
    pub user_id: UserId,
    pub token_hash: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    #[serde(default, with = "crate::utils::optional_bson_datetime")]
    pub used_at: Option<DateTime<Utc>>,
}

impl TypedIdMarker for PasswordReset {
    fn tag() -> &'static str {
        "PWR"
    }
}

impl PasswordReset {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Generates a random 32-byte token, hex encoded.
pub fn generate_token() -> Result<String, Error> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new().fill(&mut bytes)?;

    Ok(hex::encode(bytes))
}

pub fn hash_token(token: &str) -> String {
    hex::encode(digest::digest(&digest::SHA256, token.as_bytes()))
}
