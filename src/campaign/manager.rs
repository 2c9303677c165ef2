use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::database::Database;
use crate::error::Error;
use crate::space::Space;
use crate::utils::require_text;

use super::code::generate_code;
use super::{CampaignId, CampaignStatus, Counters, Reward, RewardCampaign};

const CODE_ATTEMPTS: usize = 3;

#[derive(Clone, Debug)]
pub struct NewCampaign {
    pub name: String,
    pub description: String,
    pub campaign_type: String,
    pub reward: Reward,
    pub terms_conditions: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[tracing::instrument(skip(db))]
pub async fn create_campaign(
    db: &dyn Database,
    space: &Space,
    new_campaign: NewCampaign,
) -> Result<RewardCampaign, Error> {
    let now = Utc::now();
    let starts_at = new_campaign.starts_at.unwrap_or(now);
    if let Some(ends_at) = new_campaign.ends_at {
        if ends_at <= starts_at {
            return Err(Error::InvalidField {
                field: "ends_at",
                reason: "must be after the start of the campaign",
            });
        }
    }
    if let Some(quantity) = new_campaign.reward.quantity {
        if quantity <= 0 {
            return Err(Error::InvalidField {
                field: "quantity",
                reason: "must be greater than zero",
            });
        }
    }

    let reward = Reward {
        kind: require_text("type", new_campaign.reward.kind)?,
        value: require_text("value", new_campaign.reward.value)?,
        quantity: new_campaign.reward.quantity,
    };

    let mut campaign = RewardCampaign {
        id: CampaignId::new(),
        space_id: space.id,
        name: require_text("name", new_campaign.name)?,
        description: new_campaign.description,
        campaign_type: require_text("campaign_type", new_campaign.campaign_type)?,
        remaining: reward.quantity,
        reward,
        terms_conditions: new_campaign.terms_conditions,
        code: generate_code(now),
        status: CampaignStatus::Active,
        starts_at,
        ends_at: new_campaign.ends_at,
        counters: Counters::default(),
        created_at: now,
        modified_at: now,
    };

    // codes are unique at the storage layer, a collision rejects the insert
    let mut attempts = 0;
    loop {
        attempts += 1;
        match db.campaigns().insert_campaign(&campaign).await {
            Ok(()) => break,
            Err(Error::CampaignCodeAlreadyExists { code }) if attempts < CODE_ATTEMPTS => {
                warn!("campaign code {} collided, generating another", code);
                campaign.code = generate_code(now);
            }
            Err(err) => return Err(err),
        }
    }

    info!("created campaign {} with code {}", campaign.id, campaign.code);

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn get_campaigns(db: &dyn Database, space: &Space) -> Result<Vec<RewardCampaign>, Error> {
    let campaigns = db.campaigns().fetch_campaigns_by_space(space.id).await?;

    Ok(campaigns)
}

#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: &dyn Database,
    campaign_id: CampaignId,
) -> Result<Option<RewardCampaign>, Error> {
    let campaign = db.campaigns().fetch_campaign_by_id(campaign_id).await?;

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn set_campaign_status(
    db: &dyn Database,
    campaign: RewardCampaign,
    status: CampaignStatus,
) -> Result<RewardCampaign, Error> {
    if campaign.status == status {
        return Ok(campaign);
    }

    db.campaigns().update_campaign_status(campaign, status).await
}

/// Recomputes the campaign's counters by replaying its event log. Counters
/// that fell behind the log are raised to it; counters are never lowered since
/// increments can land between the count and the update.
#[tracing::instrument(skip(db))]
pub async fn reconcile_counters(
    db: &dyn Database,
    campaign: RewardCampaign,
) -> Result<RewardCampaign, Error> {
    let counters = db.events().count_events_by_campaign(campaign.id).await?;
    if campaign.counters.max(counters) == campaign.counters {
        return Ok(campaign);
    }

    warn!(
        "campaign {} counters drifted: stored {:?}, replayed {:?}",
        campaign.id, campaign.counters, counters
    );

    db.campaigns()
        .raise_campaign_counters(campaign.id, counters)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test::{test_campaign, test_space, MockDatabase};
    use chrono::Duration;
    use std::sync::{Arc, Mutex};

    fn new_campaign() -> NewCampaign {
        NewCampaign {
            name: "Weekend Special".into(),
            description: "Scan at the counter".into(),
            campaign_type: "discount".into(),
            reward: Reward {
                kind: "discount".into(),
                value: "10%".into(),
                quantity: Some(50),
            },
            terms_conditions: None,
            starts_at: None,
            ends_at: None,
        }
    }

    #[tokio::test]
    async fn can_create_campaign() {
        let mut db = MockDatabase::new();
        let space = test_space();
        let called_insert = Arc::new(Mutex::new(false));
        let called_insert_clone = Arc::clone(&called_insert);
        db.campaigns.on_insert_campaign = Box::new(move |campaign| {
            *called_insert_clone.lock().unwrap() = true;
            assert_eq!(campaign.name, "Weekend Special");
            assert!(campaign.code.starts_with("BMS-"));
            Ok(())
        });

        let campaign = create_campaign(&db, &space, new_campaign()).await.unwrap();

        assert_eq!(campaign.space_id, space.id);
        assert_eq!(campaign.status, CampaignStatus::Active);
        assert_eq!(campaign.remaining, Some(50));
        assert_eq!(campaign.counters, Counters::default());
        assert!(
            *called_insert.lock().unwrap(),
            "db.insert_campaign was not called"
        );
    }

    #[tokio::test]
    async fn create_campaign_retries_with_fresh_code_on_collision() {
        let mut db = MockDatabase::new();
        let space = test_space();
        let seen_codes = Arc::new(Mutex::new(Vec::new()));
        let seen_codes_clone = Arc::clone(&seen_codes);
        db.campaigns.on_insert_campaign = Box::new(move |campaign| {
            let mut seen = seen_codes_clone.lock().unwrap();
            seen.push(campaign.code.clone());
            if seen.len() == 1 {
                Err(Error::CampaignCodeAlreadyExists {
                    code: campaign.code.clone(),
                })
            } else {
                Ok(())
            }
        });

        let campaign = create_campaign(&db, &space, new_campaign()).await.unwrap();

        let seen = seen_codes.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0], seen[1]);
        assert_eq!(campaign.code, seen[1]);
    }

    #[tokio::test]
    async fn create_campaign_gives_up_after_repeated_collisions() {
        let mut db = MockDatabase::new();
        let space = test_space();
        db.campaigns.on_insert_campaign = Box::new(|campaign| {
            Err(Error::CampaignCodeAlreadyExists {
                code: campaign.code.clone(),
            })
        });

        let result = create_campaign(&db, &space, new_campaign()).await;

        assert!(matches!(
            result,
            Err(Error::CampaignCodeAlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn create_campaign_rejects_inverted_window() {
        let db = MockDatabase::new();
        let space = test_space();
        let now = Utc::now();
        let mut body = new_campaign();
        body.starts_at = Some(now);
        body.ends_at = Some(now - Duration::hours(1));

        let result = create_campaign(&db, &space, body).await;

        assert_eq!(
            result.unwrap_err(),
            Error::InvalidField {
                field: "ends_at",
                reason: "must be after the start of the campaign"
            }
        );
    }

    #[tokio::test]
    async fn set_campaign_status_skips_noop_updates() {
        let db = MockDatabase::new();
        let campaign = test_campaign(test_space().id);

        let campaign = set_campaign_status(&db, campaign, CampaignStatus::Active)
            .await
            .unwrap();

        assert_eq!(campaign.status, CampaignStatus::Active);
    }

    #[tokio::test]
    async fn set_campaign_status_deactivates() {
        let mut db = MockDatabase::new();
        db.campaigns.on_update_campaign_status = Box::new(|mut campaign, status| {
            campaign.status = status;
            Ok(campaign)
        });
        let campaign = test_campaign(test_space().id);

        let campaign = set_campaign_status(&db, campaign, CampaignStatus::Inactive)
            .await
            .unwrap();

        assert_eq!(campaign.status, CampaignStatus::Inactive);
    }

    fn counter_db(stored: Arc<Mutex<Counters>>, campaign: RewardCampaign) -> MockDatabase {
        let mut db = MockDatabase::new();
        db.campaigns.on_raise_campaign_counters = Box::new(move |campaign_id, counters| {
            assert_eq!(campaign_id, campaign.id);
            let mut stored = stored.lock().unwrap();
            *stored = stored.max(counters);
            let mut campaign = campaign.clone();
            campaign.counters = *stored;
            Ok(campaign)
        });
        db
    }

    #[tokio::test]
    async fn reconcile_counters_raises_drifted_counters() {
        let mut campaign = test_campaign(test_space().id);
        campaign.counters.scan_count = 6;
        let stored = Arc::new(Mutex::new(campaign.counters));
        let mut db = counter_db(Arc::clone(&stored), campaign.clone());
        let replayed = Counters {
            scan_count: 7,
            engagement_count: 3,
            redemption_count: 1,
        };
        db.events.on_count_events_by_campaign = Box::new(move |_| Ok(replayed));

        let campaign = reconcile_counters(&db, campaign).await.unwrap();

        assert_eq!(campaign.counters, replayed);
        assert_eq!(*stored.lock().unwrap(), replayed);
    }

    #[tokio::test]
    async fn reconcile_counters_keeps_increments_made_after_counting() {
        let mut campaign = test_campaign(test_space().id);
        campaign.counters = Counters {
            scan_count: 7,
            engagement_count: 2,
            redemption_count: 1,
        };
        let before = campaign.counters;
        let stored = Arc::new(Mutex::new(before));
        let mut db = counter_db(Arc::clone(&stored), campaign.clone());
        let replayed = Counters {
            scan_count: 7,
            engagement_count: 3,
            redemption_count: 1,
        };
        let stored_clone = Arc::clone(&stored);
        db.events.on_count_events_by_campaign = Box::new(move |_| {
            // an engage finishes its increment right after the events are counted
            let mut stored = stored_clone.lock().unwrap();
            stored.scan_count += 1;
            stored.engagement_count += 1;
            Ok(replayed)
        });

        let campaign = reconcile_counters(&db, campaign).await.unwrap();

        let expected = Counters {
            scan_count: 8,
            engagement_count: 3,
            redemption_count: 1,
        };
        assert_eq!(campaign.counters, expected);
        assert_eq!(*stored.lock().unwrap(), expected);
        assert_eq!(campaign.counters.max(before), campaign.counters);
        assert_eq!(campaign.counters.max(replayed), campaign.counters);
    }

    #[tokio::test]
    async fn reconcile_counters_never_lowers_counters() {
        let mut campaign = test_campaign(test_space().id);
        campaign.counters.scan_count = 9;
        let mut db = MockDatabase::new();
        db.events.on_count_events_by_campaign = Box::new(|_| {
            Ok(Counters {
                scan_count: 8,
                engagement_count: 0,
                redemption_count: 0,
            })
        });

        let campaign = reconcile_counters(&db, campaign).await.unwrap();

        assert_eq!(campaign.counters.scan_count, 9);
    }
}
