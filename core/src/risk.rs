//! Campaign risk classification from rollup totals.
//!
//! Tiers are assigned from campaign-level impression/click totals summed
//! across all rollup days. The threshold comparisons use integer
//! cross-multiplication — no floating point — so counts that land exactly
//! on a boundary classify on the correct side of the strict "<".

use crate::{
    error::EngineResult,
    store::AdStore,
    types::CampaignId,
};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<RiskTier> {
        match s {
            "Low" => Some(RiskTier::Low),
            "Medium" => Some(RiskTier::Medium),
            "High" => Some(RiskTier::High),
            _ => None,
        }
    }
}

impl ToSql for RiskTier {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for RiskTier {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        RiskTier::parse(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown risk tier '{s}'").into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRiskFlag {
    pub campaign_id: CampaignId,
    pub tier: RiskTier,
    pub reason: String,
    pub refreshed_at: DateTime<Utc>,
}

/// First match wins. Zero impressions is the explicit first branch — never a
/// division.
pub fn classify(impressions: i64, clicks: i64) -> (RiskTier, &'static str) {
    if impressions == 0 {
        return (RiskTier::High, "No impressions");
    }
    // clicks / impressions < 1/200, exactly.
    if clicks * 200 < impressions {
        return (RiskTier::High, "Very low CTR (<0.5%)");
    }
    // clicks / impressions < 1/100, exactly.
    if clicks * 100 < impressions {
        return (RiskTier::Medium, "Low CTR (<1%)");
    }
    (RiskTier::Low, "Healthy performance")
}

pub struct RiskClassifier;

impl RiskClassifier {
    /// Compute a flag for every campaign that owns at least one ad.
    /// Campaigns without ads produce no row at all.
    pub fn rebuild(
        store: &AdStore,
        refreshed_at: DateTime<Utc>,
    ) -> EngineResult<Vec<CampaignRiskFlag>> {
        let totals: HashMap<CampaignId, (i64, i64)> = store
            .campaign_rollup_totals()?
            .into_iter()
            .map(|t| (t.campaign_id, (t.impressions, t.clicks)))
            .collect();

        let flags = store
            .campaign_ids_with_ads()?
            .into_iter()
            .map(|campaign_id| {
                let (impressions, clicks) =
                    totals.get(&campaign_id).copied().unwrap_or((0, 0));
                let (tier, reason) = classify(impressions, clicks);
                CampaignRiskFlag {
                    campaign_id,
                    tier,
                    reason: reason.to_string(),
                    refreshed_at,
                }
            })
            .collect();
        Ok(flags)
    }

    /// Discard the materialized flags and recompute them wholesale.
    /// Returns the number of rows written.
    pub fn refresh(store: &AdStore, refreshed_at: DateTime<Utc>) -> EngineResult<usize> {
        let flags = Self::rebuild(store, refreshed_at)?;
        store.replace_risk_flags(&flags)
    }
}
