use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{bson, Collection};

use crate::campaign::db::CampaignStore;
use crate::campaign::RewardCampaign;
use crate::engagement::db::EventStore;
use crate::engagement::EngagementEvent;
use crate::error::Error;
use crate::payment::db::SubscriptionStore;
use crate::payment::Subscription;
use crate::reset::db::PasswordResetStore;
use crate::reset::PasswordReset;
use crate::space::db::SpaceStore;
use crate::space::Space;
use crate::user::db::UserStore;
use crate::user::User;

pub type MongoSpaceStore = Collection<Space>;
pub type MongoCampaignStore = Collection<RewardCampaign>;
pub type MongoEventStore = Collection<EngagementEvent>;
pub type MongoUserStore = Collection<User>;
pub type MongoPasswordResetStore = Collection<PasswordReset>;
pub type MongoSubscriptionStore = Collection<Subscription>;

const SPACES: &str = "spaces";
const CAMPAIGNS: &str = "campaigns";
const EVENTS: &str = "engagement_events";
const USERS: &str = "users";
const PASSWORD_RESETS: &str = "password_resets";
const SUBSCRIPTIONS: &str = "subscriptions";

const DUPLICATE_KEY: i32 = 11000;

pub trait Database: Send + Sync {
    fn spaces(&self) -> &dyn SpaceStore;
    fn campaigns(&self) -> &dyn CampaignStore;
    fn events(&self) -> &dyn EventStore;
    fn users(&self) -> &dyn UserStore;
    fn password_resets(&self) -> &dyn PasswordResetStore;
    fn subscriptions(&self) -> &dyn SubscriptionStore;
}

/// Whether the write was rejected by a unique index.
pub fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(err)) if err.code == DUPLICATE_KEY
    )
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    spaces: MongoSpaceStore,
    campaigns: MongoCampaignStore,
    events: MongoEventStore,
    users: MongoUserStore,
    password_resets: MongoPasswordResetStore,
    subscriptions: MongoSubscriptionStore,
}

impl MongoDatabase {
    #[tracing::instrument(skip(db))]
    pub async fn initialize(db: mongodb::Database) -> Result<MongoDatabase, Error> {
        create_indexes(
            &db,
            SPACES,
            vec![bson::doc! { "key": { "owner_id": 1 }, "name": "by_owner_id" }],
        )
        .await?;
        create_indexes(
            &db,
            CAMPAIGNS,
            vec![
                bson::doc! { "key": { "code": 1 }, "name": "by_code", "unique": true },
                bson::doc! { "key": { "space_id": 1 }, "name": "by_space_id" },
            ],
        )
        .await?;
        create_indexes(
            &db,
            EVENTS,
            vec![bson::doc! {
                "key": { "campaign_id": 1, "created_at": -1 },
                "name": "by_campaign_id_and_created_at"
            }],
        )
        .await?;
        create_indexes(
            &db,
            USERS,
            vec![bson::doc! { "key": { "email": 1 }, "name": "by_email", "unique": true }],
        )
        .await?;
        create_indexes(
            &db,
            PASSWORD_RESETS,
            vec![bson::doc! { "key": { "token_hash": 1 }, "name": "by_token_hash", "unique": true }],
        )
        .await?;
        create_indexes(
            &db,
            SUBSCRIPTIONS,
            vec![bson::doc! { "key": { "order_id": 1 }, "name": "by_order_id", "unique": true }],
        )
        .await?;

        Ok(MongoDatabase {
            spaces: db.collection(SPACES),
            campaigns: db.collection(CAMPAIGNS),
            events: db.collection(EVENTS),
            users: db.collection(USERS),
            password_resets: db.collection(PASSWORD_RESETS),
            subscriptions: db.collection(SUBSCRIPTIONS),
        })
    }
}

async fn create_indexes(
    db: &mongodb::Database,
    collection: &str,
    indexes: Vec<bson::Document>,
) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": collection,
            "indexes": indexes,
        },
        None,
    )
    .await?;

    Ok(())
}

impl Database for MongoDatabase {
    fn spaces(&self) -> &dyn SpaceStore {
        &self.spaces
    }

    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }

    fn events(&self) -> &dyn EventStore {
        &self.events
    }

    fn users(&self) -> &dyn UserStore {
        &self.users
    }

    fn password_resets(&self) -> &dyn PasswordResetStore {
        &self.password_resets
    }

    fn subscriptions(&self) -> &dyn SubscriptionStore {
        &self.subscriptions
    }
}
