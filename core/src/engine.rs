//! The refresh engine — orchestrates materialized-table rebuilds.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Daily rollup rebuild
//!   2. Campaign risk flags
//!
//! RULES:
//!   - Tasks run in registration order, every cycle.
//!   - Risk flags are only ever computed against a fully rebuilt rollup.
//!   - The first task failure aborts the cycle: later tasks do not run and
//!     the previously materialized tables stay as they were.
//!   - Every cycle is recorded in the refresh_cycle audit table.

use crate::{
    cleaner::{self, CleanStats},
    error::EngineResult,
    risk::RiskClassifier,
    rollup_engine::DailyRollupEngine,
    store::AdStore,
    validator::{self, ValidationReport},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The contract every refresh task must fulfill.
pub trait RefreshTask: Send {
    /// Unique stable name for this task.
    fn name(&self) -> &'static str;

    /// Rebuild this task's materialized table from the store's current
    /// contents. `refreshed_at` is the cycle start time, so every table
    /// rebuilt in one cycle carries the same stamp.
    /// Returns the number of rows written.
    fn refresh(&self, store: &AdStore, refreshed_at: DateTime<Utc>) -> EngineResult<usize>;
}

struct RollupRefreshTask;

impl RefreshTask for RollupRefreshTask {
    fn name(&self) -> &'static str {
        "daily_rollup"
    }

    fn refresh(&self, store: &AdStore, _refreshed_at: DateTime<Utc>) -> EngineResult<usize> {
        DailyRollupEngine::refresh(store)
    }
}

struct RiskRefreshTask;

impl RefreshTask for RiskRefreshTask {
    fn name(&self) -> &'static str {
        "campaign_risk"
    }

    fn refresh(&self, store: &AdStore, refreshed_at: DateTime<Utc>) -> EngineResult<usize> {
        RiskClassifier::refresh(store, refreshed_at)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub task: &'static str,
    pub rows_written: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<TaskOutcome>,
}

pub struct RefreshEngine {
    store: AdStore,
    tasks: Vec<Box<dyn RefreshTask>>,
}

impl RefreshEngine {
    pub fn new(store: AdStore) -> Self {
        Self {
            store,
            tasks: Vec::new(),
        }
    }

    /// Build a fully wired engine with both refresh tasks registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(store: AdStore) -> Self {
        let mut engine = RefreshEngine::new(store);
        // EXECUTION ORDER — fixed, documented, never reordered.
        engine.register(Box::new(RollupRefreshTask));
        engine.register(Box::new(RiskRefreshTask));
        engine
    }

    /// Register a refresh task. Call in the documented execution order.
    pub fn register(&mut self, task: Box<dyn RefreshTask>) {
        self.tasks.push(task);
    }

    pub fn store(&self) -> &AdStore {
        &self.store
    }

    /// Run one full refresh cycle: every task, in order, against the store's
    /// current contents. Re-running a failed cycle redoes the same
    /// deterministic computation — retry is always safe.
    pub fn run_cycle(&self) -> EngineResult<CycleReport> {
        let cycle_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        self.store.open_refresh_cycle(&cycle_id, started_at)?;
        log::info!("refresh cycle {cycle_id} started");

        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            match task.refresh(&self.store, started_at) {
                Ok(rows_written) => {
                    log::info!("task '{}' wrote {rows_written} rows", task.name());
                    outcomes.push(TaskOutcome {
                        task: task.name(),
                        rows_written,
                    });
                }
                Err(e) => {
                    log::error!("task '{}' failed: {e}", task.name());
                    self.store
                        .fail_refresh_cycle(&cycle_id, Utc::now(), &e.to_string())?;
                    return Err(e);
                }
            }
        }

        let detail = serde_json::to_string(&outcomes)?;
        self.store
            .complete_refresh_cycle(&cycle_id, Utc::now(), &detail)?;
        log::info!("refresh cycle {cycle_id} completed");
        Ok(CycleReport {
            cycle_id,
            started_at,
            outcomes,
        })
    }

    /// Validate the store's current contents. Read-only; findings are for
    /// operators, not control flow.
    pub fn validate(&self) -> EngineResult<ValidationReport> {
        validator::validate_store(&self.store)
    }

    /// Apply the field-normalization pass to the store's current contents.
    pub fn clean(&self) -> EngineResult<CleanStats> {
        cleaner::clean_store(&self.store)
    }
}
