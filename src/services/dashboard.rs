//! Dashboard service: the single entry point for operator-facing views
//!
//! Composes a document store, the configured exclusion list and per-query
//! caches. The aggregation functions stay pure; caching happens only here.

use std::hash::Hash;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DashConfig;
use crate::services::aggregator::{Aggregator, ExclusionList};
use crate::services::cache::TtlCache;
use crate::services::{lookup, plan};
use crate::store::DocumentStore;
use crate::types::{
    FeedbackRecord, FeedbackSummary, OverallStats, PlanState, PlanUpdate, Result, UsageRollup,
    UserSearchTotal, UserStats, UserSummary, Worksheet,
};

/// Everything the per-user view shows
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserOverview {
    pub user_id: String,
    pub display_name: Option<String>,
    pub plan: PlanState,
    pub stats: UserStats,
    pub worksheets: Vec<Worksheet>,
}

/// Population view: overall counts plus the usage rollup
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PopulationOverview {
    pub overall: OverallStats,
    pub usage: UsageRollup,
}

pub struct Dashboard {
    store: Box<dyn DocumentStore>,
    exclusions: ExclusionList,
    fresh_reads: bool,
    users: TtlCache<(), Vec<UserSummary>>,
    user_stats: TtlCache<String, UserStats>,
    plan_states: TtlCache<String, PlanState>,
    worksheets: TtlCache<String, Vec<Worksheet>>,
    overall: TtlCache<(), OverallStats>,
    rollup: TtlCache<(), UsageRollup>,
    leaderboard: TtlCache<(), Vec<UserSearchTotal>>,
}

impl Dashboard {
    pub fn new(store: Box<dyn DocumentStore>, config: &DashConfig) -> Self {
        let ttl = config.cache_ttl();
        Self {
            store,
            exclusions: config.exclusions(),
            fresh_reads: false,
            users: TtlCache::new(ttl),
            user_stats: TtlCache::new(ttl),
            plan_states: TtlCache::new(ttl),
            worksheets: TtlCache::new(ttl),
            overall: TtlCache::new(ttl),
            rollup: TtlCache::new(ttl),
            leaderboard: TtlCache::new(ttl),
        }
    }

    /// Bypass cached snapshots on every read (results still repopulate the cache)
    pub fn with_fresh_reads(mut self, fresh: bool) -> Self {
        self.fresh_reads = fresh;
        self
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    fn cached<K, V, F>(&self, cache: &TtlCache<K, V>, key: K, compute: F) -> Result<V>
    where
        K: Eq + Hash + Clone + std::fmt::Debug,
        V: Clone,
        F: FnOnce() -> Result<V>,
    {
        if self.fresh_reads {
            cache.refresh_with(key, compute)
        } else {
            cache.get_or_try_insert_with(key, compute)
        }
    }

    pub fn users(&self) -> Result<Vec<UserSummary>> {
        self.cached(&self.users, (), || lookup::list_users(self.store()))
    }

    pub fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        self.cached(&self.user_stats, user_id.to_string(), || {
            Aggregator::user_stats(self.store(), user_id)
        })
    }

    pub fn plan_state(&self, user_id: &str) -> Result<PlanState> {
        self.cached(&self.plan_states, user_id.to_string(), || {
            let record = lookup::user_record(self.store(), user_id)?;
            plan::plan_state(record.as_ref(), Utc::now())
        })
    }

    pub fn worksheets(&self, user_id: &str) -> Result<Vec<Worksheet>> {
        self.cached(&self.worksheets, user_id.to_string(), || {
            lookup::worksheets(self.store(), user_id)
        })
    }

    pub fn user_overview(&self, user_id: &str) -> Result<UserOverview> {
        let display_name = self
            .users()?
            .into_iter()
            .find(|u| u.id == user_id)
            .map(|u| u.display_name);
        if display_name.is_none() {
            warn!(user_id, "user not found, showing defaults");
        }

        Ok(UserOverview {
            user_id: user_id.to_string(),
            display_name,
            plan: self.plan_state(user_id)?,
            stats: self.user_stats(user_id)?,
            worksheets: self.worksheets(user_id)?,
        })
    }

    pub fn overall_stats(&self) -> Result<OverallStats> {
        self.cached(&self.overall, (), || {
            Aggregator::overall_stats(self.store(), &self.exclusions)
        })
    }

    pub fn usage_rollup(&self) -> Result<UsageRollup> {
        self.cached(&self.rollup, (), || {
            Aggregator::usage_rollup(self.store(), &self.exclusions)
        })
    }

    pub fn population_overview(&self) -> Result<PopulationOverview> {
        Ok(PopulationOverview {
            overall: self.overall_stats()?,
            usage: self.usage_rollup()?,
        })
    }

    pub fn search_leaderboard(&self) -> Result<Vec<UserSearchTotal>> {
        self.cached(&self.leaderboard, (), || {
            Aggregator::search_leaderboard(self.store(), &self.exclusions)
        })
    }

    pub fn feedback(&self) -> Result<(Vec<FeedbackRecord>, FeedbackSummary)> {
        let records = lookup::feedback(self.store())?;
        let summary = FeedbackSummary::from_records(&records);
        Ok((records, summary))
    }

    /// Apply an operator plan change. Never cached; drops the user's cached plan state.
    pub fn update_plan(&self, user_id: &str, requested: &str) -> Result<PlanUpdate> {
        let update = plan::update_plan(self.store(), user_id, requested, Utc::now())
            .inspect_err(|e| {
                warn!(user_id, plan = requested, error = %e, "plan update failed");
            })?;
        self.plan_states.invalidate(&user_id.to_string());
        Ok(update)
    }

    /// Drop every cached snapshot
    pub fn refresh(&self) {
        debug!("clearing dashboard caches");
        self.users.clear();
        self.user_stats.clear();
        self.plan_states.clear();
        self.worksheets.clear();
        self.overall.clear();
        self.rollup.clear();
        self.leaderboard.clear();
    }
}
