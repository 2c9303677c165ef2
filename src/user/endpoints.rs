use actix_web::web::{Data, Json, Path};
use actix_web::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Error;

use super::{manager, Role, User, UserId};

#[derive(Clone, Serialize, Deserialize)]
pub struct CreateUserBody {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password: String,
}

impl std::fmt::Debug for CreateUserBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserBody")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserBody {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl UserBody {
    pub fn render(user: User) -> UserBody {
        UserBody {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
            modified_at: user.modified_at,
        }
    }
}

#[post("/users")]
#[tracing::instrument(skip(db))]
pub async fn create_user(
    db: Data<Box<dyn Database>>,
    body: Json<CreateUserBody>,
) -> Result<Json<UserBody>, Error> {
    let body = body.into_inner();

    let user =
        manager::register_user(&***db, body.email, body.name, body.role, body.password).await?;

    Ok(Json(UserBody::render(user)))
}

#[get("/users/{user_id}")]
#[tracing::instrument(skip(db))]
pub async fn get_user_by_id(
    db: Data<Box<dyn Database>>,
    params: Path<UserId>,
) -> Result<Json<UserBody>, Error> {
    let user_id = params.into_inner();
    let user = manager::get_user_by_id(&***db, user_id)
        .await?
        .ok_or(Error::UserNotFound { user_id })?;

    Ok(Json(UserBody::render(user)))
}
