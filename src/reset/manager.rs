use chrono::{DateTime, Utc};
use tracing::info;

use crate::database::Database;
use crate::error::Error;
use crate::mailer::Mailer;
use crate::user::manager::normalize_email;
use crate::user::password::{hash_password, validate_password};

use super::{generate_token, hash_token, token_lifetime, PasswordReset, PasswordResetId};

/// Issues a reset token and mails a link to it. Unknown emails are accepted
/// silently so the endpoint cannot be used to discover which accounts exist.
#[tracing::instrument(skip(db, mailer))]
pub async fn request_password_reset(
    db: &dyn Database,
    mailer: &dyn Mailer,
    base_url: &str,
    email: &str,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let email = normalize_email(email)?;
    let user = match db.users().fetch_user_by_email(&email).await? {
        Some(user) => user,
        None => {
            info!("password reset requested for unknown email");
            return Ok(());
        }
    };

    let token = generate_token()?;
    let reset = PasswordReset {
        id: PasswordResetId::new(),
        user_id: user.id,
        token_hash: hash_token(&token),
        created_at: now,
        expires_at: now + token_lifetime(),
        used_at: None,
    };

    db.password_resets().insert_reset(&reset).await?;

    let link = format!(
        "{}/reset-password?token={}",
        base_url.trim_end_matches('/'),
        token
    );
    mailer.send_password_reset(&user.email, &link).await?;

    Ok(())
}

#[tracing::instrument(skip(db, token, password))]
pub async fn reset_password(
    db: &dyn Database,
    token: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    validate_password(password)?;

    let reset = db
        .password_resets()
        .fetch_reset_by_token_hash(&hash_token(token.trim()))
        .await?
        .ok_or(Error::InvalidResetToken)?;

    if reset.used_at.is_some() {
        return Err(Error::ResetTokenAlreadyUsed);
    }
    if reset.is_expired(now) {
        return Err(Error::ResetTokenExpired);
    }

    // another request may have consumed the token since it was fetched
    let reset = db
        .password_resets()
        .consume_reset(reset.id, now)
        .await?
        .ok_or(Error::ResetTokenAlreadyUsed)?;

    let password_hash = hash_password(password)?;
    db.users()
        .update_user_password(reset.user_id, password_hash)
        .await?;

    info!("password reset completed for user {}", reset.user_id);

    Ok(())
}
