//! Dimensional tables: users, campaigns, ads.

use super::AdStore;
use crate::{
    error::EngineResult,
    model::{Ad, Campaign, User},
    types::{AdId, CampaignId},
};
use rusqlite::params;

impl AdStore {
    // ── Users ──────────────────────────────────────────────────

    pub fn insert_user(&self, u: &User) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO users (user_id, gender, age, age_group, country, location, interests)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                u.user_id,
                u.gender,
                u.age,
                u.age_group,
                u.country,
                u.location,
                u.interests
            ],
        )?;
        Ok(())
    }

    pub fn all_users(&self) -> EngineResult<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, gender, age, age_group, country, location, interests
             FROM users ORDER BY user_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(User {
                user_id: row.get(0)?,
                gender: row.get(1)?,
                age: row.get(2)?,
                age_group: row.get(3)?,
                country: row.get(4)?,
                location: row.get(5)?,
                interests: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Overwrite each listed user in place. One transaction for the batch.
    pub fn update_users(&self, users: &[User]) -> EngineResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for u in users {
            tx.execute(
                "UPDATE users
                 SET gender = ?2, age = ?3, age_group = ?4,
                     country = ?5, location = ?6, interests = ?7
                 WHERE user_id = ?1",
                params![
                    u.user_id,
                    u.gender,
                    u.age,
                    u.age_group,
                    u.country,
                    u.location,
                    u.interests
                ],
            )?;
        }
        tx.commit()?;
        Ok(users.len())
    }

    /// Delete a user. Events keep existing with their user reference
    /// cleared — the weak-reference side of the model.
    pub fn delete_user(&self, user_id: &str) -> EngineResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE events SET user_id = NULL WHERE user_id = ?1",
            params![user_id],
        )?;
        tx.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
        tx.commit()?;
        Ok(())
    }

    pub fn user_count(&self) -> EngineResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(Into::into)
    }

    // ── Campaigns ──────────────────────────────────────────────

    pub fn insert_campaign(&self, c: &Campaign) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO campaigns (campaign_id, name, start_date, end_date, duration_days, budget)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                c.campaign_id,
                c.name,
                c.start_date,
                c.end_date,
                c.duration_days,
                c.budget
            ],
        )?;
        Ok(())
    }

    pub fn all_campaigns(&self) -> EngineResult<Vec<Campaign>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, name, start_date, end_date, duration_days, budget
             FROM campaigns ORDER BY campaign_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Campaign {
                campaign_id: row.get(0)?,
                name: row.get(1)?,
                start_date: row.get(2)?,
                end_date: row.get(3)?,
                duration_days: row.get(4)?,
                budget: row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_campaigns(&self, campaigns: &[Campaign]) -> EngineResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for c in campaigns {
            tx.execute(
                "UPDATE campaigns
                 SET name = ?2, start_date = ?3, end_date = ?4,
                     duration_days = ?5, budget = ?6
                 WHERE campaign_id = ?1",
                params![
                    c.campaign_id,
                    c.name,
                    c.start_date,
                    c.end_date,
                    c.duration_days,
                    c.budget
                ],
            )?;
        }
        tx.commit()?;
        Ok(campaigns.len())
    }

    /// Delete a campaign and, by cascade, its ads and their events.
    pub fn delete_campaign(&self, campaign_id: CampaignId) -> EngineResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM events
             WHERE ad_id IN (SELECT ad_id FROM ads WHERE campaign_id = ?1)",
            params![campaign_id],
        )?;
        tx.execute("DELETE FROM ads WHERE campaign_id = ?1", params![campaign_id])?;
        tx.execute(
            "DELETE FROM campaigns WHERE campaign_id = ?1",
            params![campaign_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn campaign_count(&self) -> EngineResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM campaigns", [], |row| row.get(0))
            .map_err(Into::into)
    }

    /// Campaigns that own at least one ad — the population the risk
    /// classifier produces flags for.
    pub fn campaign_ids_with_ads(&self) -> EngineResult<Vec<CampaignId>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT campaign_id FROM ads ORDER BY campaign_id",
        )?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // ── Ads ────────────────────────────────────────────────────

    pub fn insert_ad(&self, a: &Ad) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO ads (ad_id, campaign_id, platform, ad_type,
                              target_gender, target_age_group, target_interests)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                a.ad_id,
                a.campaign_id,
                a.platform,
                a.ad_type,
                a.target_gender,
                a.target_age_group,
                a.target_interests
            ],
        )?;
        Ok(())
    }

    pub fn all_ads(&self) -> EngineResult<Vec<Ad>> {
        let mut stmt = self.conn.prepare(
            "SELECT ad_id, campaign_id, platform, ad_type,
                    target_gender, target_age_group, target_interests
             FROM ads ORDER BY ad_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Ad {
                ad_id: row.get(0)?,
                campaign_id: row.get(1)?,
                platform: row.get(2)?,
                ad_type: row.get(3)?,
                target_gender: row.get(4)?,
                target_age_group: row.get(5)?,
                target_interests: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_ads(&self, ads: &[Ad]) -> EngineResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for a in ads {
            tx.execute(
                "UPDATE ads
                 SET campaign_id = ?2, platform = ?3, ad_type = ?4,
                     target_gender = ?5, target_age_group = ?6, target_interests = ?7
                 WHERE ad_id = ?1",
                params![
                    a.ad_id,
                    a.campaign_id,
                    a.platform,
                    a.ad_type,
                    a.target_gender,
                    a.target_age_group,
                    a.target_interests
                ],
            )?;
        }
        tx.commit()?;
        Ok(ads.len())
    }

    /// Delete an ad and, by cascade, its events.
    pub fn delete_ad(&self, ad_id: AdId) -> EngineResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM events WHERE ad_id = ?1", params![ad_id])?;
        tx.execute("DELETE FROM ads WHERE ad_id = ?1", params![ad_id])?;
        tx.commit()?;
        Ok(())
    }

    pub fn ad_count(&self) -> EngineResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM ads", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
