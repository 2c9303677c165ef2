use chrono::Utc;

use crate::database::Database;
use crate::error::Error;
use crate::utils::require_text;

use super::password::{hash_password, validate_password};
use super::{Role, User, UserId};

pub fn normalize_email(email: &str) -> Result<String, Error> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(Error::InvalidField {
            field: "email",
            reason: "must be a valid email address",
        });
    }

    Ok(email)
}

#[tracing::instrument(skip(db, password))]
pub async fn register_user(
    db: &dyn Database,
    email: String,
    name: String,
    role: Role,
    password: String,
) -> Result<User, Error> {
    let email = normalize_email(&email)?;
    let name = require_text("name", name)?;
    validate_password(&password)?;

    let now = Utc::now();
    let user = User {
        id: UserId::new(),
        email,
        name,
        role,
        password_hash: hash_password(&password)?,
        created_at: now,
        modified_at: now,
    };

    db.users().insert_user(&user).await?;

    Ok(user)
}

#[tracing::instrument(skip(db))]
pub async fn get_user_by_id(db: &dyn Database, user_id: UserId) -> Result<Option<User>, Error> {
    let user = db.users().fetch_user_by_id(user_id).await?;

    Ok(user)
}
