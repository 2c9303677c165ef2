use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::typedid::{TypedId, TypedIdMarker};
use crate::user::UserId;

pub mod db;
pub mod endpoints;
pub mod gateway;
pub mod manager;
pub use endpoints::*;

pub type SubscriptionId = TypedId<Subscription>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan: String,
    /// In the currency's minor unit (paise for INR).
    pub amount: i64,
    pub currency: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub status: SubscriptionStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl TypedIdMarker for Subscription {
    fn tag() -> &'static str {
        "SUB"
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Active,
}
