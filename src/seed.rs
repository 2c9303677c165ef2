use chrono::Utc;
use tracing::info;

use crate::campaign::{CampaignId, CampaignStatus, Counters, Reward, RewardCampaign};
use crate::database::Database;
use crate::error::Error;
use crate::space::{Space, SpaceId};
use crate::user::password::hash_password;
use crate::user::{Role, User, UserId};

pub const DEMO_CAMPAIGN_CODE: &str = "BMS-1700000000-abc123xyz";
const DEMO_OWNER_EMAIL: &str = "demo-owner@blookmyspace.com";
const DEMO_SPACE_NAME: &str = "Demo Cafe";

/// Inserts a demo owner, space and campaign so the demo code resolves. Does
/// nothing if the demo campaign is already present.
#[tracing::instrument(skip(db))]
pub async fn seed(db: &dyn Database) -> Result<(), Error> {
    if db
        .campaigns()
        .fetch_campaign_by_code(DEMO_CAMPAIGN_CODE)
        .await?
        .is_some()
    {
        info!("demo campaign {} already present", DEMO_CAMPAIGN_CODE);
        return Ok(());
    }

    let now = Utc::now();

    let owner = match db.users().fetch_user_by_email(DEMO_OWNER_EMAIL).await? {
        Some(owner) => owner,
        None => {
            // nobody is meant to sign in as the demo owner
            let password = crate::reset::generate_token()?;
            let owner = User {
                id: UserId::new(),
                email: DEMO_OWNER_EMAIL.to_string(),
                name: "Demo Owner".to_string(),
                role: Role::SpaceOwner,
                password_hash: hash_password(&password)?,
                created_at: now,
                modified_at: now,
            };
            db.users().insert_user(&owner).await?;
            owner
        }
    };

    let existing = db.spaces().fetch_spaces_by_owner(owner.id).await?;
    let space = match existing.into_iter().find(|space| space.name == DEMO_SPACE_NAME) {
        Some(space) => space,
        None => {
            let space = Space {
                id: SpaceId::new(),
                owner_id: owner.id,
                name: DEMO_SPACE_NAME.to_string(),
                description: Some("A cafe with a QR standee on every table".to_string()),
                address: "12 MG Road".to_string(),
                city: "Bengaluru".to_string(),
                state: Some("Karnataka".to_string()),
                pincode: Some("560001".to_string()),
                location: None,
                created_at: now,
                modified_at: now,
            };
            db.spaces().insert_space(&space).await?;
            space
        }
    };

    let campaign = RewardCampaign {
        id: CampaignId::new(),
        space_id: space.id,
        name: "Welcome Offer".to_string(),
        description: "Scan the code on your table for 10% off your order".to_string(),
        campaign_type: "discount".to_string(),
        reward: Reward {
            kind: "discount".to_string(),
            value: "10%".to_string(),
            quantity: None,
        },
        remaining: None,
        terms_conditions: Some("One redemption per visit.".to_string()),
        code: DEMO_CAMPAIGN_CODE.to_string(),
        status: CampaignStatus::Active,
        starts_at: now,
        ends_at: None,
        counters: Counters::default(),
        created_at: now,
        modified_at: now,
    };

    db.campaigns().insert_campaign(&campaign).await?;

    info!("seeded demo campaign {}", DEMO_CAMPAIGN_CODE);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test::{test_campaign, test_space, test_user, MockDatabase};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn seeding_is_skipped_when_present() {
        let mut db = MockDatabase::new();
        db.campaigns.on_fetch_campaign_by_code =
            Box::new(|_| Ok(Some(test_campaign(test_space().id))));

        seed(&db).await.unwrap();
    }

    #[tokio::test]
    async fn seeding_inserts_owner_space_and_campaign() {
        let mut db = MockDatabase::new();
        let spaces = Arc::new(Mutex::new(Vec::new()));
        let campaigns = Arc::new(Mutex::new(Vec::new()));
        let spaces_clone = Arc::clone(&spaces);
        let campaigns_clone = Arc::clone(&campaigns);
        db.campaigns.on_fetch_campaign_by_code = Box::new(|_| Ok(None));
        db.users.on_fetch_user_by_email = Box::new(|_| Ok(None));
        db.spaces.on_fetch_spaces_by_owner = Box::new(|_| Ok(Vec::new()));
        db.users.on_insert_user = Box::new(|user| {
            assert_eq!(user.role, Role::SpaceOwner);
            Ok(())
        });
        db.spaces.on_insert_space = Box::new(move |space| {
            spaces_clone.lock().unwrap().push(space.clone());
            Ok(())
        });
        db.campaigns.on_insert_campaign = Box::new(move |campaign| {
            campaigns_clone.lock().unwrap().push(campaign.clone());
            Ok(())
        });

        seed(&db).await.unwrap();

        let spaces = spaces.lock().unwrap();
        let campaigns = campaigns.lock().unwrap();
        assert_eq!(spaces.len(), 1);
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].code, DEMO_CAMPAIGN_CODE);
        assert_eq!(campaigns[0].space_id, spaces[0].id);
        assert_eq!(campaigns[0].reward.value, "10%");
        assert!(campaigns[0].is_live(Utc::now()));
    }

    #[tokio::test]
    async fn seeding_reuses_an_existing_demo_space() {
        let mut db = MockDatabase::new();
        let owner = test_user();
        let owner_id = owner.id;
        let mut space = test_space();
        space.owner_id = owner_id;
        space.name = DEMO_SPACE_NAME.to_string();
        let space_id = space.id;
        let campaigns = Arc::new(Mutex::new(Vec::new()));
        let campaigns_clone = Arc::clone(&campaigns);
        db.campaigns.on_fetch_campaign_by_code = Box::new(|_| Ok(None));
        db.users.on_fetch_user_by_email = Box::new(move |_| Ok(Some(owner.clone())));
        db.spaces.on_fetch_spaces_by_owner = Box::new(move |id| {
            assert_eq!(id, owner_id);
            Ok(vec![test_space(), space.clone()])
        });
        db.campaigns.on_insert_campaign = Box::new(move |campaign| {
            campaigns_clone.lock().unwrap().push(campaign.clone());
            Ok(())
        });

        seed(&db).await.unwrap();

        let campaigns = campaigns.lock().unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].space_id, space_id);
    }
}
