use std::num::NonZeroU32;

use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::Error;

const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = ring::digest::SHA256_OUTPUT_LEN;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_password(password: &str) -> Result<(), Error> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidField {
            field: "password",
            reason: "must be at least 8 characters",
        });
    }

    Ok(())
}

/// Hashes into `<iterations>$<hex salt>$<hex hash>`.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new().fill(&mut salt)?;

    let iterations = NonZeroU32::new(ITERATIONS).ok_or(Error::CryptoFailure)?;
    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(ALGORITHM, iterations, &salt, password.as_bytes(), &mut hash);

    Ok(format!(
        "{}${}${}",
        ITERATIONS,
        hex::encode(salt),
        hex::encode(hash)
    ))
}

#[cfg(test)]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (iterations, salt, hash) = match (parts.next(), parts.next(), parts.next()) {
        (Some(iterations), Some(salt), Some(hash)) => (iterations, salt, hash),
        _ => return false,
    };

    let iterations = match iterations.parse().ok().and_then(NonZeroU32::new) {
        Some(iterations) => iterations,
        None => return false,
    };
    let (salt, hash) = match (hex::decode(salt), hex::decode(hash)) {
        (Ok(salt), Ok(hash)) => (salt, hash),
        _ => return false,
    };

    pbkdf2::verify(ALGORITHM, iterations, &salt, password.as_bytes(), &hash).is_ok()
}
