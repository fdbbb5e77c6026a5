//! Daily campaign rollup — full rebuild, never an incremental merge.
//!
//! Rebuilding from scratch keeps the table correct under retroactive edits
//! and backfilled events, at the cost of re-scanning all events per refresh.
//! The computed table is swapped in through the store in one transaction, so
//! a failure anywhere before the commit leaves the prior rollup untouched.

use crate::{
    analytic_join::AnalyticJoin,
    error::EngineResult,
    model::EventType,
    store::AdStore,
    types::{CampaignId, Day},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One aggregate row per (campaign, calendar day): five counters, one per
/// event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRollup {
    pub campaign_id: CampaignId,
    pub day: Day,
    pub impressions: i64,
    pub clicks: i64,
    pub likes: i64,
    pub shares: i64,
    pub conversions: i64,
}

impl DailyRollup {
    fn empty(campaign_id: CampaignId, day: Day) -> Self {
        Self {
            campaign_id,
            day,
            impressions: 0,
            clicks: 0,
            likes: 0,
            shares: 0,
            conversions: 0,
        }
    }

    pub fn count(&self, ty: EventType) -> i64 {
        match ty {
            EventType::Impression => self.impressions,
            EventType::Click => self.clicks,
            EventType::Like => self.likes,
            EventType::Share => self.shares,
            EventType::Conversion => self.conversions,
        }
    }

    fn bump(&mut self, ty: EventType) {
        match ty {
            EventType::Impression => self.impressions += 1,
            EventType::Click => self.clicks += 1,
            EventType::Like => self.likes += 1,
            EventType::Share => self.shares += 1,
            EventType::Conversion => self.conversions += 1,
        }
    }
}

pub struct DailyRollupEngine;

impl DailyRollupEngine {
    /// Compute the full rollup from the analytic join. Undated events are
    /// excluded; everything else counts under the event's own date, even
    /// when it falls outside the campaign window (the validator reports
    /// those separately).
    pub fn rebuild(store: &AdStore) -> EngineResult<Vec<DailyRollup>> {
        let events = store.all_events()?;
        let join = AnalyticJoin::load(store)?;

        let mut groups: BTreeMap<(CampaignId, Day), DailyRollup> = BTreeMap::new();
        for row in join.join(&events) {
            let row = row?;
            let Some(day) = row.day() else { continue };
            groups
                .entry((row.campaign_id, day))
                .or_insert_with(|| DailyRollup::empty(row.campaign_id, day))
                .bump(row.event_type);
        }
        Ok(groups.into_values().collect())
    }

    /// Discard the materialized rollup and recompute it wholesale.
    /// Returns the number of rows written.
    pub fn refresh(store: &AdStore) -> EngineResult<usize> {
        let rows = Self::rebuild(store)?;
        store.replace_daily_rollups(&rows)
    }
}
