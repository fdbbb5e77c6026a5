use adperf_core::{
    engine::RefreshEngine,
    model::{Ad, AdEvent, Campaign, EventType},
    risk::RiskTier,
    store::AdStore,
};
use chrono::NaiveDateTime;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn mk_engine() -> RefreshEngine {
    let store = AdStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    RefreshEngine::build(store)
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("timestamp")
}

fn campaign(id: i64, start: &str, end: &str) -> Campaign {
    Campaign {
        campaign_id: id,
        name: format!("campaign-{id}"),
        start_date: Some(start.parse().expect("date")),
        end_date: Some(end.parse().expect("date")),
        duration_days: None,
        budget: Some(2500.0),
    }
}

fn ad(id: i64, campaign_id: i64) -> Ad {
    Ad {
        ad_id: id,
        campaign_id,
        platform: Some("facebook".to_string()),
        ad_type: Some("carousel".to_string()),
        target_gender: None,
        target_age_group: None,
        target_interests: None,
    }
}

fn seed_events(
    store: &AdStore,
    first_id: i64,
    ad_id: i64,
    count: i64,
    ty: EventType,
    when: &str,
) {
    for i in 0..count {
        store
            .insert_event(&AdEvent {
                event_id: first_id + i,
                ad_id,
                user_id: None,
                occurred_at: Some(ts(when)),
                day_of_week: None,
                time_of_day: None,
                event_type: ty,
            })
            .expect("insert event");
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn cycle_runs_rollup_then_risk_in_order() {
    let engine = mk_engine();
    let report = engine.run_cycle().unwrap();

    let order: Vec<&str> = report.outcomes.iter().map(|o| o.task).collect();
    assert_eq!(order, vec!["daily_rollup", "campaign_risk"]);
    assert_eq!(
        engine.store().refresh_cycle_count("completed").unwrap(),
        1
    );
}

/// The end-to-end scenario: one campaign, one ad, 1000 impressions and 3
/// clicks inside the window. Rollup totals land in the performance view,
/// CTR is 0.3%, and the campaign flags High.
#[test]
fn low_ctr_campaign_flows_through_to_high_flag() {
    let engine = mk_engine();
    let store = engine.store();
    store
        .insert_campaign(&campaign(1, "2024-06-01", "2024-06-30"))
        .unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();
    seed_events(store, 1, 1, 1000, EventType::Impression, "2024-06-10 09:00:00");
    seed_events(store, 5000, 1, 3, EventType::Click, "2024-06-10 10:00:00");

    engine.run_cycle().unwrap();

    let perf = store.campaign_performance().unwrap();
    assert_eq!(perf.len(), 1);
    assert_eq!(perf[0].impressions, 1000);
    assert_eq!(perf[0].clicks, 3);
    let ctr = perf[0].ctr.expect("ctr present");
    assert!((ctr - 0.003).abs() < 1e-12, "ctr = {ctr}");

    let flag = store.risk_flag_for(1).unwrap().unwrap();
    assert_eq!(flag.tier, RiskTier::High);
    assert_eq!(flag.reason, "Very low CTR (<0.5%)");
}

#[test]
fn twelve_clicks_per_thousand_flows_through_to_low_flag() {
    let engine = mk_engine();
    let store = engine.store();
    store
        .insert_campaign(&campaign(1, "2024-06-01", "2024-06-30"))
        .unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();
    seed_events(store, 1, 1, 1000, EventType::Impression, "2024-06-10 09:00:00");
    seed_events(store, 5000, 1, 12, EventType::Click, "2024-06-10 10:00:00");

    engine.run_cycle().unwrap();

    let flag = engine.store().risk_flag_for(1).unwrap().unwrap();
    assert_eq!(flag.tier, RiskTier::Low);
}

/// Rerunning a cycle against unchanged data is a no-op for consumers: same
/// rollup rows, same tiers and reasons.
#[test]
fn rerunning_a_cycle_is_idempotent() {
    let engine = mk_engine();
    let store = engine.store();
    store
        .insert_campaign(&campaign(1, "2024-06-01", "2024-06-30"))
        .unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();
    seed_events(store, 1, 1, 50, EventType::Impression, "2024-06-10 09:00:00");
    seed_events(store, 5000, 1, 1, EventType::Click, "2024-06-10 10:00:00");

    engine.run_cycle().unwrap();
    let rollups_first = store.daily_rollups().unwrap();
    let flags_first = store.risk_flags().unwrap();

    engine.run_cycle().unwrap();
    let rollups_second = store.daily_rollups().unwrap();
    let flags_second = store.risk_flags().unwrap();

    assert_eq!(rollups_first, rollups_second);
    assert_eq!(flags_first.len(), flags_second.len());
    for (a, b) in flags_first.iter().zip(&flags_second) {
        assert_eq!((a.campaign_id, a.tier, &a.reason), (b.campaign_id, b.tier, &b.reason));
    }
    assert_eq!(store.refresh_cycle_count("completed").unwrap(), 2);
}

/// A cycle that fails mid-way records the failure and leaves every
/// previously materialized table untouched.
#[test]
fn failed_cycle_is_audited_and_preserves_prior_state() {
    let engine = mk_engine();
    let store = engine.store();
    store
        .insert_campaign(&campaign(1, "2024-06-01", "2024-06-30"))
        .unwrap();
    store.insert_ad(&ad(1, 1)).unwrap();
    seed_events(store, 1, 1, 10, EventType::Impression, "2024-06-10 09:00:00");

    engine.run_cycle().unwrap();
    let rollups_before = store.daily_rollups().unwrap();
    let flags_before = store.risk_flags().unwrap();

    // Dirty import: an event whose ad does not resolve poisons the next
    // rollup rebuild.
    store
        .insert_event(&AdEvent {
            event_id: 9999,
            ad_id: 404,
            user_id: None,
            occurred_at: Some(ts("2024-06-12 09:00:00")),
            day_of_week: None,
            time_of_day: None,
            event_type: EventType::Click,
        })
        .unwrap();

    assert!(engine.run_cycle().is_err());
    assert_eq!(store.refresh_cycle_count("failed").unwrap(), 1);

    // Readers still see the prior cycle's state, in full.
    assert_eq!(store.daily_rollups().unwrap(), rollups_before);
    assert_eq!(store.risk_flags().unwrap().len(), flags_before.len());
}
