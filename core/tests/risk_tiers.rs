use adperf_core::{
    model::{Ad, AdEvent, Campaign, EventType},
    risk::{RiskClassifier, RiskTier},
    rollup_engine::DailyRollupEngine,
    store::AdStore,
};
use chrono::{NaiveDateTime, Utc};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn mk_store() -> AdStore {
    let store = AdStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("timestamp")
}

fn campaign(id: i64) -> Campaign {
    Campaign {
        campaign_id: id,
        name: format!("campaign-{id}"),
        start_date: None,
        end_date: None,
        duration_days: None,
        budget: Some(500.0),
    }
}

fn ad(id: i64, campaign_id: i64) -> Ad {
    Ad {
        ad_id: id,
        campaign_id,
        platform: None,
        ad_type: None,
        target_gender: None,
        target_age_group: None,
        target_interests: None,
    }
}

/// Insert `count` events of one type for an ad, ids starting at `first_id`.
fn seed_events(store: &AdStore, first_id: i64, ad_id: i64, count: i64, ty: EventType) {
    for i in 0..count {
        store
            .insert_event(&AdEvent {
                event_id: first_id + i,
                ad_id,
                user_id: None,
                occurred_at: Some(ts("2024-06-10 09:00:00")),
                day_of_week: None,
                time_of_day: None,
                event_type: ty,
            })
            .expect("insert event");
    }
}

fn refresh_all(store: &AdStore) {
    DailyRollupEngine::refresh(store).expect("rollup refresh");
    RiskClassifier::refresh(store, Utc::now()).expect("risk refresh");
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn very_low_ctr_flags_high() {
    let store = mk_store();
    store.insert_campaign(&campaign(1)).unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();
    seed_events(&store, 1, 1, 1000, EventType::Impression);
    seed_events(&store, 5000, 1, 3, EventType::Click);

    refresh_all(&store);

    let flag = store.risk_flag_for(1).unwrap().unwrap();
    assert_eq!(flag.tier, RiskTier::High);
    assert_eq!(flag.reason, "Very low CTR (<0.5%)");
}

#[test]
fn healthy_ctr_flags_low() {
    let store = mk_store();
    store.insert_campaign(&campaign(1)).unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();
    seed_events(&store, 1, 1, 1000, EventType::Impression);
    seed_events(&store, 5000, 1, 12, EventType::Click);

    refresh_all(&store);

    let flag = store.risk_flag_for(1).unwrap().unwrap();
    assert_eq!(flag.tier, RiskTier::Low);
    assert_eq!(flag.reason, "Healthy performance");
}

/// 2 clicks over 400 impressions is 0.005 exactly. The comparison is strict
/// "<", so the campaign is Medium, not High — no floating-point rounding may
/// shift it.
#[test]
fn exact_half_percent_ctr_is_medium() {
    let store = mk_store();
    store.insert_campaign(&campaign(1)).unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();
    seed_events(&store, 1, 1, 400, EventType::Impression);
    seed_events(&store, 5000, 1, 2, EventType::Click);

    refresh_all(&store);

    let flag = store.risk_flag_for(1).unwrap().unwrap();
    assert_eq!(flag.tier, RiskTier::Medium);
    assert_eq!(flag.reason, "Low CTR (<1%)");
}

#[test]
fn campaign_with_ads_but_no_events_flags_no_impressions() {
    let store = mk_store();
    store.insert_campaign(&campaign(1)).unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();

    refresh_all(&store);

    let flag = store.risk_flag_for(1).unwrap().unwrap();
    assert_eq!(flag.tier, RiskTier::High);
    assert_eq!(flag.reason, "No impressions");
}

/// A campaign with zero ads is excluded entirely — no flag row, no default
/// tier.
#[test]
fn campaign_without_ads_gets_no_flag() {
    let store = mk_store();
    store.insert_campaign(&campaign(1)).unwrap();
    store.insert_campaign(&campaign(2)).unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();

    refresh_all(&store);

    assert!(store.risk_flag_for(1).unwrap().is_some());
    assert!(store.risk_flag_for(2).unwrap().is_none());
    assert_eq!(store.risk_flags().unwrap().len(), 1);
}

/// Flags are recomputed wholesale: a campaign that loses its ads loses its
/// flag on the next refresh instead of keeping a stale row.
#[test]
fn flags_are_rebuilt_not_patched() {
    let store = mk_store();
    store.insert_campaign(&campaign(1)).unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();
    seed_events(&store, 1, 1, 10, EventType::Impression);

    refresh_all(&store);
    assert!(store.risk_flag_for(1).unwrap().is_some());

    store.delete_ad(1).unwrap();
    refresh_all(&store);
    assert!(store.risk_flag_for(1).unwrap().is_none());
}

/// Totals aggregate across all rollup days before classification.
#[test]
fn classification_uses_totals_across_days() {
    let store = mk_store();
    store.insert_campaign(&campaign(1)).unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();
    // 200 impressions on one day, 200 on another, 2 clicks total: exactly
    // 0.005 across days → Medium.
    for i in 0..200 {
        store
            .insert_event(&AdEvent {
                event_id: i + 1,
                ad_id: 1,
                user_id: None,
                occurred_at: Some(ts("2024-06-10 09:00:00")),
                day_of_week: None,
                time_of_day: None,
                event_type: EventType::Impression,
            })
            .unwrap();
        store
            .insert_event(&AdEvent {
                event_id: i + 1000,
                ad_id: 1,
                user_id: None,
                occurred_at: Some(ts("2024-06-11 09:00:00")),
                day_of_week: None,
                time_of_day: None,
                event_type: EventType::Impression,
            })
            .unwrap();
    }
    seed_events(&store, 5000, 1, 2, EventType::Click);

    refresh_all(&store);

    let flag = store.risk_flag_for(1).unwrap().unwrap();
    assert_eq!(flag.tier, RiskTier::Medium);
}
