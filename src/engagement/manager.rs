use chrono::Utc;
use tracing::error;

use crate::campaign::db::CounterIncrement;
use crate::campaign::RewardCampaign;
use crate::database::Database;
use crate::error::Error;

use super::{ClientInfo, EngagementAction, EngagementEvent, EventId};

/// Appends an event for `action` and bumps the campaign's counters.
///
/// The event log is authoritative: once the event is written, a failure to
/// increment the counters is logged and the action still succeeds. Counters
/// can be rebuilt later with [`crate::campaign::manager::reconcile_counters`].
#[tracing::instrument(skip(db))]
pub async fn record_engagement(
    db: &dyn Database,
    campaign: &RewardCampaign,
    action: EngagementAction,
    client: ClientInfo,
) -> Result<EngagementEvent, Error> {
    let claims_reward = action.redeemed() && campaign.remaining.is_some();
    if claims_reward {
        let claimed = db.campaigns().claim_reward(campaign.id).await?;
        if !claimed {
            return Err(Error::RewardsExhausted {
                campaign_id: campaign.id,
            });
        }
    }

    let event = EngagementEvent {
        id: EventId::new(),
        campaign_id: campaign.id,
        action,
        engaged: action.engaged(),
        redeemed: action.redeemed(),
        user_agent: client.user_agent,
        client_id: client.client_id,
        created_at: Utc::now(),
    };

    if let Err(err) = db.events().insert_event(&event).await {
        if claims_reward {
            release_reward(db, campaign).await;
        }
        return Err(err);
    }

    let increment = counter_increment(&event);
    if let Err(err) = db
        .campaigns()
        .increment_counters(campaign.id, increment)
        .await
    {
        error!(
            "event {} was recorded but counters for campaign {} were not incremented by {:?}: {}",
            event.id, campaign.id, increment, err
        );
    }

    Ok(event)
}

#[tracing::instrument(skip(db))]
pub async fn get_events(
    db: &dyn Database,
    campaign: &RewardCampaign,
) -> Result<Vec<EngagementEvent>, Error> {
    let events = db.events().fetch_events_by_campaign(campaign.id).await?;

    Ok(events)
}

/// Returns a reward whose redemption was never recorded.
async fn release_reward(db: &dyn Database, campaign: &RewardCampaign) {
    if let Err(err) = db.campaigns().release_reward(campaign.id).await {
        error!(
            "a reward claimed from campaign {} was not recorded and could not be returned: {}",
            campaign.id, err
        );
    }
}

fn counter_increment(event: &EngagementEvent) -> CounterIncrement {
    CounterIncrement {
        scans: 1,
        engagements: event.engaged as i64,
        redemptions: event.redeemed as i64,
    }
}
