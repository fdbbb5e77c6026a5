//! Event-level analytic projection: each event joined to its ad, campaign
//! and (when resolvable) user context.
//!
//! This is the shared read both the daily rollup and any segmentation query
//! build on, so grouping keys and null handling live here and nowhere else.
//! User context is a left join: an event with no resolvable user still
//! appears, with user fields absent. A dangling ad or campaign reference
//! fails fast instead — the caller's refresh aborts and the previously
//! materialized tables stay untouched.

use crate::{
    error::{EngineError, EngineResult},
    model::{Ad, AdEvent, Campaign, EventType, User},
    store::AdStore,
    types::{AdId, CampaignId, Day, EventId, UserId},
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticRow {
    // Event
    pub event_id: EventId,
    pub event_type: EventType,
    pub occurred_at: Option<NaiveDateTime>,
    pub day_of_week: Option<String>,
    pub time_of_day: Option<String>,
    // Ad context
    pub ad_id: AdId,
    pub platform: Option<String>,
    pub ad_type: Option<String>,
    pub target_gender: Option<String>,
    pub target_age_group: Option<String>,
    pub target_interests: Option<String>,
    // Campaign context
    pub campaign_id: CampaignId,
    pub campaign_name: String,
    pub campaign_budget: Option<f64>,
    pub campaign_start: Option<NaiveDate>,
    pub campaign_end: Option<NaiveDate>,
    // User context (left join — absent when the event has no user, or the
    // user reference does not resolve)
    pub user_id: Option<UserId>,
    pub user_gender: Option<String>,
    pub user_age: Option<i64>,
    pub user_age_group: Option<String>,
    pub user_country: Option<String>,
}

impl AnalyticRow {
    /// The grouping date: the event's own date, never the campaign window.
    pub fn day(&self) -> Option<Day> {
        self.occurred_at.map(|ts| ts.date())
    }
}

/// Dimension context loaded once per refresh; `join` then projects lazily.
pub struct AnalyticJoin {
    users: HashMap<UserId, User>,
    campaigns: HashMap<CampaignId, Campaign>,
    ads: HashMap<AdId, Ad>,
}

impl AnalyticJoin {
    pub fn load(store: &AdStore) -> EngineResult<Self> {
        Ok(Self {
            users: store
                .all_users()?
                .into_iter()
                .map(|u| (u.user_id.clone(), u))
                .collect(),
            campaigns: store
                .all_campaigns()?
                .into_iter()
                .map(|c| (c.campaign_id, c))
                .collect(),
            ads: store.all_ads()?.into_iter().map(|a| (a.ad_id, a)).collect(),
        })
    }

    /// Lazily project each event into its denormalized analytic row.
    pub fn join<'a>(
        &'a self,
        events: &'a [AdEvent],
    ) -> impl Iterator<Item = EngineResult<AnalyticRow>> + 'a {
        events.iter().map(move |e| self.project(e))
    }

    fn project(&self, event: &AdEvent) -> EngineResult<AnalyticRow> {
        let ad = self.ads.get(&event.ad_id).ok_or(EngineError::DanglingAd {
            event_id: event.event_id,
            ad_id: event.ad_id,
        })?;
        let campaign =
            self.campaigns
                .get(&ad.campaign_id)
                .ok_or(EngineError::DanglingCampaign {
                    ad_id: ad.ad_id,
                    campaign_id: ad.campaign_id,
                })?;
        let user = event
            .user_id
            .as_ref()
            .and_then(|uid| self.users.get(uid));

        Ok(AnalyticRow {
            event_id: event.event_id,
            event_type: event.event_type,
            occurred_at: event.occurred_at,
            day_of_week: event.day_of_week.clone(),
            time_of_day: event.time_of_day.clone(),
            ad_id: ad.ad_id,
            platform: ad.platform.clone(),
            ad_type: ad.ad_type.clone(),
            target_gender: ad.target_gender.clone(),
            target_age_group: ad.target_age_group.clone(),
            target_interests: ad.target_interests.clone(),
            campaign_id: campaign.campaign_id,
            campaign_name: campaign.name.clone(),
            campaign_budget: campaign.budget,
            campaign_start: campaign.start_date,
            campaign_end: campaign.end_date,
            user_id: user.map(|u| u.user_id.clone()),
            user_gender: user.and_then(|u| u.gender.clone()),
            user_age: user.and_then(|u| u.age),
            user_age_group: user.and_then(|u| u.age_group.clone()),
            user_country: user.and_then(|u| u.country.clone()),
        })
    }
}
