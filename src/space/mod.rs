use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::typedid::{TypedId, TypedIdMarker};
use crate::user::UserId;

pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type SpaceId = TypedId<Space>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Space {
    #[serde(rename = "_id")]
    pub id: SpaceId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub location: Option<GeoPoint>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl TypedIdMarker for Space {
    fn tag() -> &'static str {
        "SPC"
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// The parts of a space that are shown to anyone who scans one of its codes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublicSpace {
    pub name: String,
    pub address: String,
    pub city: String,
}

impl From<&Space> for PublicSpace {
    fn from(space: &Space) -> PublicSpace {
        PublicSpace {
            name: space.name.clone(),
            address: space.address.clone(),
            city: space.city.clone(),
        }
    }
}
