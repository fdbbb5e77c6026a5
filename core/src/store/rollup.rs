//! Materialized analytic tables and the refresh-cycle audit log.
//!
//! Both materialized tables are replaced wholesale inside a single
//! transaction: readers on other connections observe either the prior
//! contents or the new contents in full, never a mixture.

use super::AdStore;
use crate::{
    error::EngineResult,
    risk::CampaignRiskFlag,
    rollup_engine::DailyRollup,
    types::{CampaignId, Day},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Campaign-level totals summed across all rollup days. Input to the risk
/// classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignTotals {
    pub campaign_id: CampaignId,
    pub impressions: i64,
    pub clicks: i64,
}

/// One row of vw_campaign_performance, for reporting tools and the runner
/// summary. ctr is absent when a campaign has no impressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignPerformanceRow {
    pub campaign_id: CampaignId,
    pub name: String,
    pub budget: Option<f64>,
    pub impressions: i64,
    pub clicks: i64,
    pub likes: i64,
    pub shares: i64,
    pub conversions: i64,
    pub ctr: Option<f64>,
}

impl AdStore {
    // ── Daily rollup ───────────────────────────────────────────

    /// Swap in a freshly computed rollup table.
    pub fn replace_daily_rollups(&self, rows: &[DailyRollup]) -> EngineResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM daily_campaign_rollup", [])?;
        for r in rows {
            tx.execute(
                "INSERT INTO daily_campaign_rollup
                     (campaign_id, day, impressions, clicks, likes, shares, conversions)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    r.campaign_id,
                    r.day,
                    r.impressions,
                    r.clicks,
                    r.likes,
                    r.shares,
                    r.conversions
                ],
            )?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn daily_rollups(&self) -> EngineResult<Vec<DailyRollup>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, day, impressions, clicks, likes, shares, conversions
             FROM daily_campaign_rollup
             ORDER BY campaign_id, day",
        )?;
        let rows = stmt.query_map([], rollup_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn rollup_for(
        &self,
        campaign_id: CampaignId,
        day: Day,
    ) -> EngineResult<Option<DailyRollup>> {
        self.conn
            .query_row(
                "SELECT campaign_id, day, impressions, clicks, likes, shares, conversions
                 FROM daily_campaign_rollup
                 WHERE campaign_id = ?1 AND day = ?2",
                params![campaign_id, day],
                rollup_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn campaign_rollup_totals(&self) -> EngineResult<Vec<CampaignTotals>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, SUM(impressions), SUM(clicks)
             FROM daily_campaign_rollup
             GROUP BY campaign_id
             ORDER BY campaign_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CampaignTotals {
                campaign_id: row.get(0)?,
                impressions: row.get(1)?,
                clicks: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn rollup_row_count(&self) -> EngineResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM daily_campaign_rollup", [], |row| {
                row.get(0)
            })
            .map_err(Into::into)
    }

    // ── Risk flags ─────────────────────────────────────────────

    /// Swap in a freshly computed risk-flag table.
    pub fn replace_risk_flags(&self, flags: &[CampaignRiskFlag]) -> EngineResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM campaign_risk_flag", [])?;
        for f in flags {
            tx.execute(
                "INSERT INTO campaign_risk_flag (campaign_id, risk_tier, reason, refreshed_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![f.campaign_id, f.tier, f.reason, f.refreshed_at],
            )?;
        }
        tx.commit()?;
        Ok(flags.len())
    }

    pub fn risk_flags(&self) -> EngineResult<Vec<CampaignRiskFlag>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, risk_tier, reason, refreshed_at
             FROM campaign_risk_flag
             ORDER BY campaign_id",
        )?;
        let rows = stmt.query_map([], risk_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn risk_flag_for(
        &self,
        campaign_id: CampaignId,
    ) -> EngineResult<Option<CampaignRiskFlag>> {
        self.conn
            .query_row(
                "SELECT campaign_id, risk_tier, reason, refreshed_at
                 FROM campaign_risk_flag
                 WHERE campaign_id = ?1",
                params![campaign_id],
                risk_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    // ── Refresh cycle audit ────────────────────────────────────

    pub fn open_refresh_cycle(
        &self,
        cycle_id: &str,
        started_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO refresh_cycle (cycle_id, started_at, status)
             VALUES (?1, ?2, 'running')",
            params![cycle_id, started_at],
        )?;
        Ok(())
    }

    pub fn complete_refresh_cycle(
        &self,
        cycle_id: &str,
        finished_at: DateTime<Utc>,
        detail: &str,
    ) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE refresh_cycle
             SET status = 'completed', finished_at = ?2, detail = ?3
             WHERE cycle_id = ?1",
            params![cycle_id, finished_at, detail],
        )?;
        Ok(())
    }

    pub fn fail_refresh_cycle(
        &self,
        cycle_id: &str,
        finished_at: DateTime<Utc>,
        detail: &str,
    ) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE refresh_cycle
             SET status = 'failed', finished_at = ?2, detail = ?3
             WHERE cycle_id = ?1",
            params![cycle_id, finished_at, detail],
        )?;
        Ok(())
    }

    pub fn refresh_cycle_count(&self, status: &str) -> EngineResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM refresh_cycle WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    // ── Presentation ───────────────────────────────────────────

    pub fn campaign_performance(&self) -> EngineResult<Vec<CampaignPerformanceRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, name, budget, impressions, clicks,
                    likes, shares, conversions, ctr
             FROM vw_campaign_performance
             ORDER BY campaign_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CampaignPerformanceRow {
                campaign_id: row.get(0)?,
                name: row.get(1)?,
                budget: row.get(2)?,
                impressions: row.get(3)?,
                clicks: row.get(4)?,
                likes: row.get(5)?,
                shares: row.get(6)?,
                conversions: row.get(7)?,
                ctr: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn rollup_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyRollup> {
    Ok(DailyRollup {
        campaign_id: row.get(0)?,
        day: row.get(1)?,
        impressions: row.get(2)?,
        clicks: row.get(3)?,
        likes: row.get(4)?,
        shares: row.get(5)?,
        conversions: row.get(6)?,
    })
}

fn risk_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<CampaignRiskFlag> {
    Ok(CampaignRiskFlag {
        campaign_id: row.get(0)?,
        tier: row.get(1)?,
        reason: row.get(2)?,
        refreshed_at: row.get(3)?,
    })
}
