//! The four base entities and their closed categorical types.
//!
//! Gender stays free text on purpose: the cleaner canonicalizes the common
//! spellings and lets anything else pass through unchanged. Event types and
//! risk tiers are closed enumerations, converted to their canonical strings
//! only at the store boundary.

use crate::types::{AdId, CampaignId, EventId, UserId};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub age_group: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub interests: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id: CampaignId,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_days: Option<i64>,
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub ad_id: AdId,
    pub campaign_id: CampaignId,
    pub platform: Option<String>,
    pub ad_type: Option<String>,
    pub target_gender: Option<String>,
    pub target_age_group: Option<String>,
    pub target_interests: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdEvent {
    pub event_id: EventId,
    pub ad_id: AdId,
    pub user_id: Option<UserId>,
    pub occurred_at: Option<NaiveDateTime>,
    pub day_of_week: Option<String>,
    pub time_of_day: Option<String>,
    pub event_type: EventType,
}

impl AdEvent {
    /// The event's own calendar date. Undated events have none and
    /// contribute to no rollup row.
    pub fn day(&self) -> Option<NaiveDate> {
        self.occurred_at.map(|ts| ts.date())
    }
}

// ── Event type ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Impression,
    Click,
    Like,
    Share,
    Conversion,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Impression,
        EventType::Click,
        EventType::Like,
        EventType::Share,
        EventType::Conversion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Impression => "impression",
            EventType::Click => "click",
            EventType::Like => "like",
            EventType::Share => "share",
            EventType::Conversion => "conversion",
        }
    }

    pub fn parse(s: &str) -> Option<EventType> {
        match s {
            "impression" => Some(EventType::Impression),
            "click" => Some(EventType::Click),
            "like" => Some(EventType::Like),
            "share" => Some(EventType::Share),
            "conversion" => Some(EventType::Conversion),
            _ => None,
        }
    }
}

impl ToSql for EventType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for EventType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        EventType::parse(s).ok_or_else(|| {
            FromSqlError::Other(format!("unknown event type '{s}'").into())
        })
    }
}
