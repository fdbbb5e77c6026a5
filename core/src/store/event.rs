//! Raw event fact table.

use super::AdStore;
use crate::{error::EngineResult, model::AdEvent};
use rusqlite::params;

impl AdStore {
    pub fn insert_event(&self, e: &AdEvent) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO events (event_id, ad_id, user_id, occurred_at,
                                 day_of_week, time_of_day, event_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                e.event_id,
                e.ad_id,
                e.user_id,
                e.occurred_at,
                e.day_of_week,
                e.time_of_day,
                e.event_type
            ],
        )?;
        Ok(())
    }

    pub fn all_events(&self) -> EngineResult<Vec<AdEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, ad_id, user_id, occurred_at,
                    day_of_week, time_of_day, event_type
             FROM events ORDER BY event_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AdEvent {
                event_id: row.get(0)?,
                ad_id: row.get(1)?,
                user_id: row.get(2)?,
                occurred_at: row.get(3)?,
                day_of_week: row.get(4)?,
                time_of_day: row.get(5)?,
                event_type: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_events(&self, events: &[AdEvent]) -> EngineResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for e in events {
            tx.execute(
                "UPDATE events
                 SET ad_id = ?2, user_id = ?3, occurred_at = ?4,
                     day_of_week = ?5, time_of_day = ?6, event_type = ?7
                 WHERE event_id = ?1",
                params![
                    e.event_id,
                    e.ad_id,
                    e.user_id,
                    e.occurred_at,
                    e.day_of_week,
                    e.time_of_day,
                    e.event_type
                ],
            )?;
        }
        tx.commit()?;
        Ok(events.len())
    }

    pub fn event_count(&self) -> EngineResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
