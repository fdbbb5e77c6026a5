//! Deterministic field normalization.
//!
//! Every transform is pure and idempotent: cleaning already-clean data is a
//! no-op. Rules:
//!   - trim leading/trailing whitespace on every free-text field
//!   - gender: "m"/"male" → "Male", "f"/"female" → "Female" (case-insensitive);
//!     any other non-empty value passes through unchanged
//!   - negative or absent budget → 0
//!   - age outside [0, 110] → unknown (not clamped)
//!   - events get day-of-week / time-of-day labels derived from the timestamp

use crate::{
    error::EngineResult,
    model::{Ad, AdEvent, Campaign, User},
    store::AdStore,
};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

const MAX_AGE: i64 = 110;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanStats {
    pub users_changed: usize,
    pub campaigns_changed: usize,
    pub ads_changed: usize,
    pub events_changed: usize,
}

// ── Per-entity transforms ────────────────────────────────────────────────────

pub fn clean_user(u: &User) -> User {
    User {
        user_id: u.user_id.clone(),
        gender: canonical_gender(u.gender.as_deref()),
        age: u.age.filter(|a| (0..=MAX_AGE).contains(a)),
        age_group: trimmed(u.age_group.as_deref()),
        country: trimmed(u.country.as_deref()),
        location: trimmed(u.location.as_deref()),
        interests: trimmed(u.interests.as_deref()),
    }
}

pub fn clean_campaign(c: &Campaign) -> Campaign {
    Campaign {
        campaign_id: c.campaign_id,
        name: c.name.trim().to_string(),
        start_date: c.start_date,
        end_date: c.end_date,
        duration_days: c.duration_days,
        budget: Some(c.budget.filter(|b| *b >= 0.0).unwrap_or(0.0)),
    }
}

pub fn clean_ad(a: &Ad) -> Ad {
    Ad {
        ad_id: a.ad_id,
        campaign_id: a.campaign_id,
        platform: trimmed(a.platform.as_deref()),
        ad_type: trimmed(a.ad_type.as_deref()),
        target_gender: trimmed(a.target_gender.as_deref()),
        target_age_group: trimmed(a.target_age_group.as_deref()),
        target_interests: trimmed(a.target_interests.as_deref()),
    }
}

pub fn clean_event(e: &AdEvent) -> AdEvent {
    AdEvent {
        event_id: e.event_id,
        ad_id: e.ad_id,
        user_id: trimmed(e.user_id.as_deref()),
        occurred_at: e.occurred_at,
        day_of_week: e.occurred_at.map(day_of_week_label),
        time_of_day: e.occurred_at.map(time_of_day_label),
        event_type: e.event_type,
    }
}

// ── Store pass ───────────────────────────────────────────────────────────────

/// Apply the transforms to every row, writing back only what changed.
pub fn clean_store(store: &AdStore) -> EngineResult<CleanStats> {
    let users: Vec<_> = changed(store.all_users()?, clean_user);
    let campaigns: Vec<_> = changed(store.all_campaigns()?, clean_campaign);
    let ads: Vec<_> = changed(store.all_ads()?, clean_ad);
    let events: Vec<_> = changed(store.all_events()?, clean_event);

    let stats = CleanStats {
        users_changed: store.update_users(&users)?,
        campaigns_changed: store.update_campaigns(&campaigns)?,
        ads_changed: store.update_ads(&ads)?,
        events_changed: store.update_events(&events)?,
    };
    log::info!(
        "clean pass: {} users, {} campaigns, {} ads, {} events changed",
        stats.users_changed,
        stats.campaigns_changed,
        stats.ads_changed,
        stats.events_changed
    );
    Ok(stats)
}

fn changed<T: PartialEq>(rows: Vec<T>, clean: impl Fn(&T) -> T) -> Vec<T> {
    rows.iter()
        .map(|r| clean(r))
        .zip(rows.iter())
        .filter(|(cleaned, raw)| cleaned != *raw)
        .map(|(cleaned, _)| cleaned)
        .collect()
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Trim; whitespace-only collapses to absent.
fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Canonicalize the common spellings; unrecognized non-empty values pass
/// through unchanged (trimmed only).
fn canonical_gender(value: Option<&str>) -> Option<String> {
    let v = trimmed(value)?;
    match v.to_ascii_lowercase().as_str() {
        "m" | "male" => Some("Male".to_string()),
        "f" | "female" => Some("Female".to_string()),
        _ => Some(v),
    }
}

fn day_of_week_label(ts: NaiveDateTime) -> String {
    match ts.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
    .to_string()
}

fn time_of_day_label(ts: NaiveDateTime) -> String {
    match ts.hour() {
        0..=5 => "Night",
        6..=11 => "Morning",
        12..=17 => "Afternoon",
        _ => "Evening",
    }
    .to_string()
}
