use actix_web::post;
use actix_web::web::{Data, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::database::Database;
use crate::error::Error;
use crate::mailer::Mailer;
use crate::utils::MessageBody;

use super::manager;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestPasswordResetBody {
    pub email: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ConfirmPasswordResetBody {
    pub token: String,
    pub password: String,
}

impl std::fmt::Debug for ConfirmPasswordResetBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmPasswordResetBody")
            .finish_non_exhaustive()
    }
}

#[post("/auth/password-reset")]
#[tracing::instrument(skip(db, mailer, config))]
pub async fn request_password_reset(
    db: Data<Box<dyn Database>>,
    mailer: Data<Box<dyn Mailer>>,
    config: Data<Config>,
    body: Json<RequestPasswordResetBody>,
) -> Result<Json<MessageBody>, Error> {
    let body = body.into_inner();

    manager::request_password_reset(
        &***db,
        &***mailer,
        &config.public_base_url,
        &body.email,
        Utc::now(),
    )
    .await?;

    Ok(Json(MessageBody::new(
        "If an account exists for that email, a reset link has been sent",
    )))
}

#[post("/auth/password-reset/confirm")]
#[tracing::instrument(skip(db))]
pub async fn confirm_password_reset(
    db: Data<Box<dyn Database>>,
    body: Json<ConfirmPasswordResetBody>,
) -> Result<Json<MessageBody>, Error> {
    let body = body.into_inner();

    manager::reset_password(&***db, &body.token, &body.password, Utc::now()).await?;

    Ok(Json(MessageBody::new("Password has been reset successfully")))
}
