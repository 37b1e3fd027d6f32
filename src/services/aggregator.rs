//! Aggregator service for per-user and population-wide usage statistics

use std::collections::HashSet;

use rayon::prelude::*;
use serde_json::Value;
use tracing::debug;

use crate::store::{DocumentStore, SEARCH_USAGE, USERS, WORKSHEETS};
use crate::types::{
    decode, DashError, Document, OverallStats, Result, SearchUsage, UsageRollup, UserSearchTotal,
    UserStats, NO_NAME,
};

/// Display names left out of population rollups (internal and test accounts)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    names: HashSet<String>,
}

impl ExclusionList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Users without a display name are never excluded
    pub fn contains(&self, display_name: Option<&str>) -> bool {
        display_name.is_some_and(|name| self.names.contains(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn display_name(doc: &Document) -> Option<&str> {
    doc.get("displayName").and_then(Value::as_str)
}

/// Aggregator for computing usage statistics
pub struct Aggregator;

impl Aggregator {
    /// Search counters for one user; a missing document is all zeros
    pub fn search_usage(store: &dyn DocumentStore, user_id: &str) -> Result<SearchUsage> {
        Self::decode_usage(user_id, store.get_document(SEARCH_USAGE, user_id)?)
    }

    fn decode_usage(user_id: &str, doc: Option<Document>) -> Result<SearchUsage> {
        match doc {
            Some(doc) => decode(doc, &format!("{}/{}", SEARCH_USAGE, user_id)),
            None => Ok(SearchUsage::default()),
        }
    }

    /// Usage summary for one user
    pub fn user_stats(store: &dyn DocumentStore, user_id: &str) -> Result<UserStats> {
        Self::search_usage(store, user_id).map(UserStats::from)
    }

    /// Number of worksheets a user owns (0 if they have no worksheet document)
    pub fn worksheet_count(store: &dyn DocumentStore, user_id: &str) -> Result<u64> {
        Ok(store
            .get_document(WORKSHEETS, user_id)?
            .map(|doc| doc.len() as u64)
            .unwrap_or(0))
    }

    /// One batch read of `collection` for every included user, aligned with `included`
    fn documents_for(
        store: &dyn DocumentStore,
        collection: &str,
        included: &[(String, Option<String>)],
    ) -> Result<Vec<Option<Document>>> {
        let ids: Vec<&str> = included.iter().map(|(id, _)| id.as_str()).collect();
        let docs = store.get_documents(collection, &ids)?;
        if docs.len() != ids.len() {
            return Err(DashError::Store(format!(
                "{} returned {} {} documents for {} ids",
                store.name(),
                docs.len(),
                collection,
                ids.len()
            )));
        }
        Ok(docs)
    }

    /// All user documents plus the subset that survives the exclusion list.
    /// Returns `(total user count, included (id, display name) pairs)`.
    fn partition_users(
        store: &dyn DocumentStore,
        exclusions: &ExclusionList,
    ) -> Result<(u64, Vec<(String, Option<String>)>)> {
        let users = store.stream_collection(USERS)?;
        let total = users.len() as u64;

        let included: Vec<(String, Option<String>)> = users
            .into_iter()
            .filter_map(|(id, doc)| {
                let name = display_name(&doc);
                if exclusions.contains(name) {
                    None
                } else {
                    Some((id, name.map(String::from)))
                }
            })
            .collect();

        debug!(
            total,
            included = included.len(),
            excluded = total as usize - included.len(),
            "partitioned users"
        );
        Ok((total, included))
    }

    /// Population size (every user) and worksheet count (non-excluded users)
    pub fn overall_stats(
        store: &dyn DocumentStore,
        exclusions: &ExclusionList,
    ) -> Result<OverallStats> {
        let (total_users, included) = Self::partition_users(store, exclusions)?;

        let total_worksheets = Self::documents_for(store, WORKSHEETS, &included)?
            .par_iter()
            .map(|doc| doc.as_ref().map_or(0, |d| d.len() as u64))
            .reduce(|| 0, u64::saturating_add);

        Ok(OverallStats {
            total_users,
            total_worksheets,
        })
    }

    /// Search counters summed over non-excluded users.
    ///
    /// The usage collection is read once; decoding fans out in parallel and
    /// any failed lookup or decode fails the whole rollup instead of
    /// returning a partial sum.
    pub fn usage_rollup(
        store: &dyn DocumentStore,
        exclusions: &ExclusionList,
    ) -> Result<UsageRollup> {
        let (_, included) = Self::partition_users(store, exclusions)?;

        let docs = Self::documents_for(store, SEARCH_USAGE, &included)?;

        included
            .par_iter()
            .zip(docs)
            .map(|((id, _), doc)| {
                Self::decode_usage(id, doc).map(|usage| {
                    let mut rollup = UsageRollup::default();
                    rollup.add(&usage);
                    rollup
                })
            })
            .try_reduce(UsageRollup::default, |a, b| Ok(a.merge(b)))
    }

    /// Total searches per non-excluded user that has a usage document,
    /// sorted ascending (ties broken by display name)
    pub fn search_leaderboard(
        store: &dyn DocumentStore,
        exclusions: &ExclusionList,
    ) -> Result<Vec<UserSearchTotal>> {
        let (_, included) = Self::partition_users(store, exclusions)?;

        let docs = Self::documents_for(store, SEARCH_USAGE, &included)?;

        let rows: Vec<Option<UserSearchTotal>> = included
            .par_iter()
            .zip(docs)
            .map(|((id, name), doc)| -> Result<Option<UserSearchTotal>> {
                let Some(doc) = doc else {
                    return Ok(None);
                };
                let usage: SearchUsage = decode(doc, &format!("{}/{}", SEARCH_USAGE, id))?;
                Ok(Some(UserSearchTotal {
                    user_id: id.clone(),
                    display_name: name.clone().unwrap_or_else(|| NO_NAME.to_string()),
                    total_searches: usage.total(),
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut rows: Vec<UserSearchTotal> = rows.into_iter().flatten().collect();
        rows.sort_by(|a, b| {
            a.total_searches
                .cmp(&b.total_searches)
                .then_with(|| a.display_name.cmp(&b.display_name))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Store that fails every lookup in one collection
    struct FailingStore {
        inner: MemoryStore,
        failing_collection: &'static str,
    }

    impl DocumentStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
            if collection == self.failing_collection {
                return Err(DashError::Store("connection reset".into()));
            }
            self.inner.get_document(collection, id)
        }

        fn stream_collection(&self, collection: &str) -> Result<Vec<(String, Document)>> {
            self.inner.stream_collection(collection)
        }

        fn patch_document(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
            self.inner.patch_document(collection, id, fields)
        }
    }

    /// Counts store reads per collection; each read is one parse for file backends
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        reads: Mutex<HashMap<String, usize>>,
    }

    impl CountingStore {
        fn record(&self, collection: &str) {
            *self
                .reads
                .lock()
                .unwrap()
                .entry(collection.to_string())
                .or_default() += 1;
        }

        fn reads(&self, collection: &str) -> usize {
            self.reads.lock().unwrap().get(collection).copied().unwrap_or(0)
        }
    }

    impl DocumentStore for CountingStore {
        fn name(&self) -> &str {
            "counting"
        }

        fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
            self.record(collection);
            self.inner.get_document(collection, id)
        }

        fn get_documents(&self, collection: &str, ids: &[&str]) -> Result<Vec<Option<Document>>> {
            self.record(collection);
            self.inner.get_documents(collection, ids)
        }

        fn stream_collection(&self, collection: &str) -> Result<Vec<(String, Document)>> {
            self.record(collection);
            self.inner.stream_collection(collection)
        }

        fn patch_document(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
            self.inner.patch_document(collection, id, fields)
        }
    }

    fn populated_counting_store(users: usize) -> CountingStore {
        let store = CountingStore::default();
        for i in 0..users {
            let id = format!("u{:03}", i);
            store
                .inner
                .insert(
                    USERS,
                    &id,
                    json!({"displayName": format!("User {}", i)})
                        .as_object()
                        .unwrap()
                        .clone(),
                )
                .unwrap();
            store
                .inner
                .insert(
                    SEARCH_USAGE,
                    &id,
                    json!({"customSearches": 1}).as_object().unwrap().clone(),
                )
                .unwrap();
            store
                .inner
                .insert(WORKSHEETS, &id, json!({"w": {}}).as_object().unwrap().clone())
                .unwrap();
        }
        store
    }

    fn sample_store() -> MemoryStore {
        MemoryStore::new()
            .with(USERS, "a", json!({"displayName": "Ada"}))
            .with(USERS, "b", json!({"displayName": "Bo"}))
            .with(USERS, "t", json!({"displayName": "Test Account"}))
            .with(
                SEARCH_USAGE,
                "b",
                json!({"personProfileSearches": 3, "customSearches": 1}),
            )
            .with(
                SEARCH_USAGE,
                "t",
                json!({"personProfileSearches": 100, "linkedInSearches": 50}),
            )
            .with(WORKSHEETS, "a", json!({"w1": {"name": "Leads"}, "w2": {}}))
            .with(WORKSHEETS, "b", json!({"w3": {"numRows": 10}}))
            .with(WORKSHEETS, "t", json!({"w4": {}, "w5": {}, "w6": {}}))
    }

    fn excluding_test() -> ExclusionList {
        ExclusionList::new(["Test Account"])
    }

    // ========== ExclusionList tests ==========

    #[test]
    fn test_exclusion_list_contains() {
        let list = ExclusionList::new(["Purav", "Spencer"]);
        assert!(list.contains(Some("Purav")));
        assert!(!list.contains(Some("purav")));
        assert!(!list.contains(None));
        assert_eq!(list.len(), 2);
        assert!(ExclusionList::default().is_empty());
    }

    // ========== user_stats() tests ==========

    #[test]
    fn test_user_stats_missing_document_is_zero() {
        let store = sample_store();
        let stats = Aggregator::user_stats(&store, "a").unwrap();
        assert_eq!(stats, UserStats::default());

        let unknown = Aggregator::user_stats(&store, "nobody").unwrap();
        assert_eq!(unknown, UserStats::default());
    }

    #[test]
    fn test_user_stats_total_is_sum_of_counters() {
        let store = MemoryStore::new().with(
            SEARCH_USAGE,
            "u",
            json!({
                "personProfileSearches": 7,
                "companyProfileSearches": 5,
                "customSearches": 3,
                "linkedInSearches": 2
            }),
        );
        let stats = Aggregator::user_stats(&store, "u").unwrap();
        assert_eq!(stats.total_searches, 17);
        assert_eq!(stats.person_profiles_enriched, 7);
        assert_eq!(stats.company_profiles_enriched, 5);
        assert_eq!(stats.custom_research_prompts, 3);
        assert_eq!(stats.linkedin_profiles_enriched, 2);
    }

    #[test]
    fn test_user_stats_malformed_counter_is_parse_error() {
        let store =
            MemoryStore::new().with(SEARCH_USAGE, "u", json!({"customSearches": "lots"}));
        let err = Aggregator::user_stats(&store, "u").unwrap_err();
        assert!(matches!(err, DashError::Parse(ref m) if m.contains("search-usage/u")));
    }

    #[test]
    fn test_user_stats_idempotent() {
        let store = sample_store();
        let first = Aggregator::user_stats(&store, "b").unwrap();
        let second = Aggregator::user_stats(&store, "b").unwrap();
        assert_eq!(first, second);
    }

    // ========== overall_stats() tests ==========

    #[test]
    fn test_overall_stats_counts_all_users_but_only_included_worksheets() {
        let store = sample_store();
        let stats = Aggregator::overall_stats(&store, &excluding_test()).unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_worksheets, 3); // a: 2, b: 1, t excluded
    }

    #[test]
    fn test_overall_stats_excluded_worksheets_do_not_change_total() {
        let store = sample_store();
        let before = Aggregator::overall_stats(&store, &excluding_test()).unwrap();

        store
            .insert(
                WORKSHEETS,
                "t",
                json!({"w4": {}, "w5": {}, "w6": {}, "w7": {}, "w8": {}})
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .unwrap();
        let after = Aggregator::overall_stats(&store, &excluding_test()).unwrap();

        assert_eq!(before.total_worksheets, after.total_worksheets);
    }

    #[test]
    fn test_overall_stats_without_exclusions() {
        let store = sample_store();
        let stats = Aggregator::overall_stats(&store, &ExclusionList::default()).unwrap();
        assert_eq!(stats.total_worksheets, 6);
    }

    #[test]
    fn test_overall_stats_empty_population() {
        let store = MemoryStore::new();
        let stats = Aggregator::overall_stats(&store, &excluding_test()).unwrap();
        assert_eq!(stats, OverallStats::default());
    }

    // ========== usage_rollup() tests ==========

    #[test]
    fn test_usage_rollup_two_users_one_without_record() {
        let store = MemoryStore::new()
            .with(USERS, "A", json!({"displayName": "A"}))
            .with(USERS, "B", json!({"displayName": "B"}))
            .with(
                SEARCH_USAGE,
                "B",
                json!({"personProfileSearches": 3, "customSearches": 1}),
            );

        let rollup = Aggregator::usage_rollup(&store, &ExclusionList::default()).unwrap();

        assert_eq!(rollup.total_users, 2);
        assert_eq!(rollup.total_searches, 4);
        assert_eq!(rollup.total_profile_enrichments, 3);
        assert_eq!(rollup.total_custom_research_prompts, 1);
        assert_eq!(rollup.total_company_profiles, 0);
        assert_eq!(rollup.total_linkedin_profiles, 0);
    }

    #[test]
    fn test_usage_rollup_skips_excluded_users() {
        let store = sample_store();
        let rollup = Aggregator::usage_rollup(&store, &excluding_test()).unwrap();
        assert_eq!(rollup.total_users, 2);
        assert_eq!(rollup.total_searches, 4);
        assert_eq!(rollup.total_linkedin_profiles, 0);
    }

    #[test]
    fn test_usage_rollup_total_matches_counter_sum() {
        let store = sample_store();
        let r = Aggregator::usage_rollup(&store, &ExclusionList::default()).unwrap();
        assert_eq!(
            r.total_searches,
            r.total_profile_enrichments
                + r.total_custom_research_prompts
                + r.total_company_profiles
                + r.total_linkedin_profiles
        );
        assert_eq!(r.total_searches, 154);
    }

    #[test]
    fn test_usage_rollup_empty_population() {
        let store = MemoryStore::new();
        let rollup = Aggregator::usage_rollup(&store, &ExclusionList::default()).unwrap();
        assert_eq!(rollup, UsageRollup::default());
    }

    #[test]
    fn test_usage_rollup_idempotent() {
        let store = sample_store();
        let first = Aggregator::usage_rollup(&store, &excluding_test()).unwrap();
        let second = Aggregator::usage_rollup(&store, &excluding_test()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_usage_rollup_fails_when_a_lookup_fails() {
        let store = FailingStore {
            inner: sample_store(),
            failing_collection: SEARCH_USAGE,
        };
        let result = Aggregator::usage_rollup(&store, &ExclusionList::default());
        assert!(matches!(result, Err(DashError::Store(_))));
    }

    #[test]
    fn test_overall_stats_fails_when_a_lookup_fails() {
        let store = FailingStore {
            inner: sample_store(),
            failing_collection: WORKSHEETS,
        };
        let result = Aggregator::overall_stats(&store, &ExclusionList::default());
        assert!(result.is_err());
    }

    // ========== read count tests ==========

    #[test]
    fn test_rollups_read_each_collection_once() {
        let store = populated_counting_store(50);
        let exclusions = ExclusionList::default();

        let rollup = Aggregator::usage_rollup(&store, &exclusions).unwrap();
        assert_eq!(rollup.total_searches, 50);
        assert_eq!(store.reads(USERS), 1);
        assert_eq!(store.reads(SEARCH_USAGE), 1);

        let overall = Aggregator::overall_stats(&store, &exclusions).unwrap();
        assert_eq!(overall.total_worksheets, 50);
        assert_eq!(store.reads(WORKSHEETS), 1);

        let rows = Aggregator::search_leaderboard(&store, &exclusions).unwrap();
        assert_eq!(rows.len(), 50);
        assert_eq!(store.reads(SEARCH_USAGE), 2);
        assert_eq!(store.reads(USERS), 3);
    }

    // ========== search_leaderboard() tests ==========

    #[test]
    fn test_leaderboard_sorted_ascending_and_filtered() {
        let store = sample_store().with(
            SEARCH_USAGE,
            "a",
            json!({"companyProfileSearches": 9}),
        );
        let rows = Aggregator::search_leaderboard(&store, &excluding_test()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].display_name, "Bo");
        assert_eq!(rows[0].total_searches, 4);
        assert_eq!(rows[1].display_name, "Ada");
        assert_eq!(rows[1].total_searches, 9);
    }

    #[test]
    fn test_leaderboard_omits_users_without_usage() {
        let store = sample_store();
        let rows = Aggregator::search_leaderboard(&store, &excluding_test()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "b");
    }

    #[test]
    fn test_leaderboard_unnamed_user() {
        let store = MemoryStore::new()
            .with(USERS, "x", json!({}))
            .with(SEARCH_USAGE, "x", json!({"customSearches": 1}));
        let rows = Aggregator::search_leaderboard(&store, &ExclusionList::default()).unwrap();
        assert_eq!(rows[0].display_name, "No Name");
    }
}
