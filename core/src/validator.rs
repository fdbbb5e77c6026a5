//! Read-only integrity checks over the four base entities.
//!
//! Every check runs unconditionally and reports offending row identifiers.
//! The validator never mutates data and never halts a refresh — operators
//! act on the report out of band. Dangling ad/campaign references, by
//! contrast, abort the refresh itself when the analytic join hits them.

use crate::{
    error::EngineResult,
    model::{Ad, AdEvent, Campaign, User},
    store::AdStore,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    DuplicateKey,
    MissingRequiredField,
    IncompleteProfile,
    CampaignWindowInverted,
    EventOutsideCampaignWindow,
    DanglingReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub check: Check,
    pub severity: Severity,
    pub entity: String,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// No error-severity findings. Advisory findings do not count.
    pub fn is_clean(&self) -> bool {
        self.findings.iter().all(|f| f.severity != Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    pub fn finding(&self, check: Check, entity: &str) -> Option<&Finding> {
        self.findings
            .iter()
            .find(|f| f.check == check && f.entity == entity)
    }

    fn push(&mut self, check: Check, severity: Severity, entity: &str, ids: Vec<String>) {
        if !ids.is_empty() {
            self.findings.push(Finding {
                check,
                severity,
                entity: entity.to_string(),
                ids,
            });
        }
    }
}

/// Scan the store's current contents and validate them.
pub fn validate_store(store: &AdStore) -> EngineResult<ValidationReport> {
    Ok(validate(
        &store.all_users()?,
        &store.all_campaigns()?,
        &store.all_ads()?,
        &store.all_events()?,
    ))
}

/// Validate a full dataset. Pure: no side effects, no early exit.
pub fn validate(
    users: &[User],
    campaigns: &[Campaign],
    ads: &[Ad],
    events: &[AdEvent],
) -> ValidationReport {
    let mut report = ValidationReport::default();

    // Primary-key uniqueness, per entity.
    report.push(
        Check::DuplicateKey,
        Severity::Error,
        "user",
        duplicates(users.iter().map(|u| u.user_id.clone())),
    );
    report.push(
        Check::DuplicateKey,
        Severity::Error,
        "campaign",
        duplicates(campaigns.iter().map(|c| c.campaign_id.to_string())),
    );
    report.push(
        Check::DuplicateKey,
        Severity::Error,
        "ad",
        duplicates(ads.iter().map(|a| a.ad_id.to_string())),
    );
    report.push(
        Check::DuplicateKey,
        Severity::Error,
        "event",
        duplicates(events.iter().map(|e| e.event_id.to_string())),
    );

    // Required fields. Ad campaign reference and event ad/type are
    // structurally required by the model; what can be absent is checked here.
    report.push(
        Check::MissingRequiredField,
        Severity::Error,
        "campaign",
        campaigns
            .iter()
            .filter(|c| c.name.trim().is_empty())
            .map(|c| c.campaign_id.to_string())
            .collect(),
    );
    report.push(
        Check::MissingRequiredField,
        Severity::Error,
        "event",
        events
            .iter()
            .filter(|e| e.occurred_at.is_none())
            .map(|e| e.event_id.to_string())
            .collect(),
    );

    // Completeness profiling is advisory: users missing gender or age.
    report.push(
        Check::IncompleteProfile,
        Severity::Advisory,
        "user",
        users
            .iter()
            .filter(|u| u.gender.is_none() || u.age.is_none())
            .map(|u| u.user_id.clone())
            .collect(),
    );

    // Campaign temporal sanity: end before start.
    report.push(
        Check::CampaignWindowInverted,
        Severity::Error,
        "campaign",
        campaigns
            .iter()
            .filter(|c| matches!((c.start_date, c.end_date), (Some(s), Some(e)) if e < s))
            .map(|c| c.campaign_id.to_string())
            .collect(),
    );

    // Referential integrity.
    let user_ids: HashSet<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
    let campaign_by_id: HashMap<i64, &Campaign> =
        campaigns.iter().map(|c| (c.campaign_id, c)).collect();
    let ad_by_id: HashMap<i64, &Ad> = ads.iter().map(|a| (a.ad_id, a)).collect();

    report.push(
        Check::DanglingReference,
        Severity::Error,
        "ad",
        ads.iter()
            .filter(|a| !campaign_by_id.contains_key(&a.campaign_id))
            .map(|a| a.ad_id.to_string())
            .collect(),
    );
    report.push(
        Check::DanglingReference,
        Severity::Error,
        "event",
        events
            .iter()
            .filter(|e| !ad_by_id.contains_key(&e.ad_id))
            .map(|e| e.event_id.to_string())
            .collect(),
    );
    // Weak reference: a missing user is reported but not fatal — events
    // outlive their user.
    report.push(
        Check::DanglingReference,
        Severity::Advisory,
        "event_user",
        events
            .iter()
            .filter(|e| {
                e.user_id
                    .as_deref()
                    .is_some_and(|uid| !user_ids.contains(uid))
            })
            .map(|e| e.event_id.to_string())
            .collect(),
    );

    // Event-within-campaign-window, inclusive, only when both bounds are
    // present. Reported, never auto-corrected; the rollup still counts these
    // events under their own date.
    report.push(
        Check::EventOutsideCampaignWindow,
        Severity::Error,
        "event",
        events
            .iter()
            .filter(|e| {
                let Some(day) = e.day() else { return false };
                let Some(ad) = ad_by_id.get(&e.ad_id) else { return false };
                let Some(campaign) = campaign_by_id.get(&ad.campaign_id) else {
                    return false;
                };
                match (campaign.start_date, campaign.end_date) {
                    (Some(start), Some(end)) => day < start || day > end,
                    _ => false,
                }
            })
            .map(|e| e.event_id.to_string())
            .collect(),
    );

    report
}

fn duplicates(ids: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    for id in ids {
        if !seen.insert(id.clone()) && !dups.contains(&id) {
            dups.push(id);
        }
    }
    dups
}
