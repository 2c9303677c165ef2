use chrono::Utc;

use crate::database::Database;
use crate::error::Error;
use crate::user::UserId;
use crate::utils::require_text;

use super::{GeoPoint, Space, SpaceId};

#[derive(Clone, Debug)]
pub struct NewSpace {
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub location: Option<GeoPoint>,
}

#[tracing::instrument(skip(db))]
pub async fn create_space(db: &dyn Database, new_space: NewSpace) -> Result<Space, Error> {
    db.users()
        .fetch_user_by_id(new_space.owner_id)
        .await?
        .ok_or(Error::UserNotFound {
            user_id: new_space.owner_id,
        })?;

    if let Some(location) = &new_space.location {
        if !(-90.0..=90.0).contains(&location.latitude) {
            return Err(Error::InvalidField {
                field: "latitude",
                reason: "must be between -90 and 90",
            });
        }
        if !(-180.0..=180.0).contains(&location.longitude) {
            return Err(Error::InvalidField {
                field: "longitude",
                reason: "must be between -180 and 180",
            });
        }
    }

    let now = Utc::now();
    let space = Space {
        id: SpaceId::new(),
        owner_id: new_space.owner_id,
        name: require_text("name", new_space.name)?,
        description: new_space.description,
        address: require_text("address", new_space.address)?,
        city: require_text("city", new_space.city)?,
        state: new_space.state,
        pincode: new_space.pincode,
        location: new_space.location,
        created_at: now,
        modified_at: now,
    };

    db.spaces().insert_space(&space).await?;

    Ok(space)
}

#[tracing::instrument(skip(db))]
pub async fn get_spaces(db: &dyn Database) -> Result<Vec<Space>, Error> {
    let spaces = db.spaces().fetch_spaces().await?;

    Ok(spaces)
}

#[tracing::instrument(skip(db))]
pub async fn get_space_by_id(db: &dyn Database, space_id: SpaceId) -> Result<Option<Space>, Error> {
    let space = db.spaces().fetch_space_by_id(space_id).await?;

    Ok(space)
}
