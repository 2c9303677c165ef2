use actix_web::web::{Data, Json, Path};
use actix_web::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Error;
use crate::user::UserId;

use super::manager::{self, NewSpace};
use super::{GeoPoint, Space, SpaceId};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSpaceBody {
    pub owner_id: UserId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpaceBody {
    pub id: SpaceId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub location: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl SpaceBody {
    pub fn render(space: Space) -> SpaceBody {
        SpaceBody {
            id: space.id,
            owner_id: space.owner_id,
            name: space.name,
            description: space.description,
            address: space.address,
            city: space.city,
            state: space.state,
            pincode: space.pincode,
            location: space.location,
            created_at: space.created_at,
            modified_at: space.modified_at,
        }
    }
}

#[post("/spaces")]
#[tracing::instrument(skip(db))]
pub async fn create_space(
    db: Data<Box<dyn Database>>,
    body: Json<CreateSpaceBody>,
) -> Result<Json<SpaceBody>, Error> {
    let body = body.into_inner();

    let space = manager::create_space(
        &***db,
        NewSpace {
            owner_id: body.owner_id,
            name: body.name,
            description: body.description,
            address: body.address,
            city: body.city,
            state: body.state,
            pincode: body.pincode,
            location: body.location,
        },
    )
    .await?;

    Ok(Json(SpaceBody::render(space)))
}

#[get("/spaces")]
#[tracing::instrument(skip(db))]
pub async fn get_spaces(db: Data<Box<dyn Database>>) -> Result<Json<Vec<SpaceBody>>, Error> {
    let spaces = manager::get_spaces(&***db).await?;

    let body = spaces.into_iter().map(SpaceBody::render).collect();

    Ok(Json(body))
}

#[get("/spaces/{space_id}")]
#[tracing::instrument(skip(db))]
pub async fn get_space_by_id(
    db: Data<Box<dyn Database>>,
    params: Path<SpaceId>,
) -> Result<Json<SpaceBody>, Error> {
    let space_id = params.into_inner();
    let space = manager::get_space_by_id(&***db, space_id)
        .await?
        .ok_or(Error::SpaceNotFound { space_id })?;

    Ok(Json(SpaceBody::render(space)))
}
