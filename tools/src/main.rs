//! rollup-runner: headless refresh scheduler for the ad-performance engine.
//!
//! Usage:
//!   rollup-runner --db perf.db
//!   rollup-runner --db perf.db --cycles 7 --interval-secs 86400
//!   rollup-runner --db perf.db --clean --validate

use adperf_core::{engine::RefreshEngine, store::AdStore};
use anyhow::Result;
use std::env;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let cycles = parse_arg(&args, "--cycles", 1u64);
    let interval_secs = parse_arg(&args, "--interval-secs", 0u64);
    let do_clean = args.iter().any(|a| a == "--clean");
    let do_validate = args.iter().any(|a| a == "--validate");

    println!("rollup-runner — started {}", chrono::Utc::now().to_rfc3339());
    println!("  db:             {db}");
    println!("  cycles:         {cycles}");
    println!("  interval-secs:  {interval_secs}");
    println!();

    let store = AdStore::open(db)?;
    store.migrate()?;
    let engine = RefreshEngine::build(store);

    if do_clean {
        let stats = engine.clean()?;
        println!("clean: {}", serde_json::to_string(&stats)?);
    }

    if do_validate {
        let report = engine.validate()?;
        println!("validation: {}", serde_json::to_string_pretty(&report)?);
        if !report.is_clean() {
            log::warn!(
                "validation found {} error-severity findings",
                report.errors().count()
            );
        }
    }

    // The scheduler role: rollup refresh, then risk refresh, as one cycle.
    // A failed cycle aborts the run with a non-zero exit instead of being
    // silently skipped; re-running it later is always safe.
    for i in 0..cycles {
        let report = engine.run_cycle()?;
        println!(
            "cycle {}/{} ({}): {}",
            i + 1,
            cycles,
            report.cycle_id,
            serde_json::to_string(&report.outcomes)?
        );
        if i + 1 < cycles && interval_secs > 0 {
            thread::sleep(Duration::from_secs(interval_secs));
        }
    }

    print_summary(&engine)?;
    Ok(())
}

fn print_summary(engine: &RefreshEngine) -> Result<()> {
    let store = engine.store();
    println!();
    println!("campaign performance:");
    for row in store.campaign_performance()? {
        let ctr = row
            .ctr
            .map(|c| format!("{:.2}%", c * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<6} {:<30} impressions={:<8} clicks={:<6} ctr={}",
            row.campaign_id, row.name, row.impressions, row.clicks, ctr
        );
    }
    println!();
    println!("risk flags:");
    for flag in store.risk_flags()? {
        println!(
            "  #{:<6} {:<8} {}",
            flag.campaign_id,
            flag.tier.as_str(),
            flag.reason
        );
    }
    Ok(())
}

fn parse_arg<T: FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
