//! Usage types for search-feature tracking

use serde::{Deserialize, Serialize};

/// Per-user counters from the `search-usage` collection.
///
/// Every counter defaults to 0 when the field is absent, so a missing
/// document and an all-zero document are indistinguishable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsage {
    #[serde(default)]
    pub person_profile_searches: u64,
    #[serde(default)]
    pub company_profile_searches: u64,
    #[serde(default)]
    pub custom_searches: u64,
    #[serde(default, rename = "linkedInSearches")]
    pub linkedin_searches: u64,
}

impl SearchUsage {
    pub fn total(&self) -> u64 {
        self.person_profile_searches
            .saturating_add(self.company_profile_searches)
            .saturating_add(self.custom_searches)
            .saturating_add(self.linkedin_searches)
    }
}

/// Summary of one user's feature usage
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct UserStats {
    pub total_searches: u64,
    pub person_profiles_enriched: u64,
    pub company_profiles_enriched: u64,
    pub custom_research_prompts: u64,
    pub linkedin_profiles_enriched: u64,
}

impl From<SearchUsage> for UserStats {
    fn from(usage: SearchUsage) -> Self {
        Self {
            total_searches: usage.total(),
            person_profiles_enriched: usage.person_profile_searches,
            company_profiles_enriched: usage.company_profile_searches,
            custom_research_prompts: usage.custom_searches,
            linkedin_profiles_enriched: usage.linkedin_searches,
        }
    }
}

/// Population size and worksheet count.
///
/// `total_users` counts every user document, excluded accounts included.
/// `total_worksheets` only counts worksheets of non-excluded users.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct OverallStats {
    pub total_users: u64,
    pub total_worksheets: u64,
}

/// Usage counters summed over non-excluded users.
///
/// Unlike [`OverallStats::total_users`], `total_users` here counts only the
/// users that contributed to the sums.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct UsageRollup {
    pub total_users: u64,
    pub total_searches: u64,
    pub total_profile_enrichments: u64,
    pub total_custom_research_prompts: u64,
    pub total_company_profiles: u64,
    pub total_linkedin_profiles: u64,
}

impl UsageRollup {
    /// Fold one included user into the rollup
    pub fn add(&mut self, usage: &SearchUsage) {
        self.total_users = self.total_users.saturating_add(1);
        self.total_profile_enrichments = self
            .total_profile_enrichments
            .saturating_add(usage.person_profile_searches);
        self.total_custom_research_prompts = self
            .total_custom_research_prompts
            .saturating_add(usage.custom_searches);
        self.total_company_profiles = self
            .total_company_profiles
            .saturating_add(usage.company_profile_searches);
        self.total_linkedin_profiles = self
            .total_linkedin_profiles
            .saturating_add(usage.linkedin_searches);
        self.total_searches = self.total_searches.saturating_add(usage.total());
    }

    /// Combine two partial rollups
    pub fn merge(mut self, other: Self) -> Self {
        self.total_users = self.total_users.saturating_add(other.total_users);
        self.total_searches = self.total_searches.saturating_add(other.total_searches);
        self.total_profile_enrichments = self
            .total_profile_enrichments
            .saturating_add(other.total_profile_enrichments);
        self.total_custom_research_prompts = self
            .total_custom_research_prompts
            .saturating_add(other.total_custom_research_prompts);
        self.total_company_profiles = self
            .total_company_profiles
            .saturating_add(other.total_company_profiles);
        self.total_linkedin_profiles = self
            .total_linkedin_profiles
            .saturating_add(other.total_linkedin_profiles);
        self
    }
}

/// One bar of the "total searches by user" chart
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSearchTotal {
    pub user_id: String,
    pub display_name: String,
    pub total_searches: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(person: u64, company: u64, custom: u64, linkedin: u64) -> SearchUsage {
        SearchUsage {
            person_profile_searches: person,
            company_profile_searches: company,
            custom_searches: custom,
            linkedin_searches: linkedin,
        }
    }

    #[test]
    fn test_search_usage_total() {
        assert_eq!(usage(3, 2, 1, 4).total(), 10);
        assert_eq!(SearchUsage::default().total(), 0);
    }

    #[test]
    fn test_search_usage_missing_fields_default_to_zero() {
        let parsed: SearchUsage = serde_json::from_str(r#"{"personProfileSearches": 3}"#).unwrap();
        assert_eq!(parsed, usage(3, 0, 0, 0));
    }

    #[test]
    fn test_search_usage_field_names() {
        let parsed: SearchUsage = serde_json::from_str(
            r#"{"personProfileSearches":1,"companyProfileSearches":2,"customSearches":3,"linkedInSearches":4}"#,
        )
        .unwrap();
        assert_eq!(parsed, usage(1, 2, 3, 4));
    }

    #[test]
    fn test_search_usage_ignores_unknown_fields() {
        let parsed: SearchUsage =
            serde_json::from_str(r#"{"customSearches": 2, "lastSearchAt": "2024-01-01"}"#)
                .unwrap();
        assert_eq!(parsed.custom_searches, 2);
    }

    #[test]
    fn test_search_usage_rejects_negative_counter() {
        let parsed: std::result::Result<SearchUsage, _> =
            serde_json::from_str(r#"{"customSearches": -1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_user_stats_from_usage() {
        let stats = UserStats::from(usage(3, 2, 1, 4));
        assert_eq!(stats.total_searches, 10);
        assert_eq!(stats.person_profiles_enriched, 3);
        assert_eq!(stats.company_profiles_enriched, 2);
        assert_eq!(stats.custom_research_prompts, 1);
        assert_eq!(stats.linkedin_profiles_enriched, 4);
    }

    #[test]
    fn test_rollup_add_counts_user_even_with_zero_usage() {
        let mut rollup = UsageRollup::default();
        rollup.add(&SearchUsage::default());
        assert_eq!(rollup.total_users, 1);
        assert_eq!(rollup.total_searches, 0);
    }

    #[test]
    fn test_rollup_merge_matches_sequential_add() {
        let a = usage(3, 0, 1, 0);
        let b = usage(1, 2, 0, 5);

        let mut sequential = UsageRollup::default();
        sequential.add(&a);
        sequential.add(&b);

        let mut left = UsageRollup::default();
        left.add(&a);
        let mut right = UsageRollup::default();
        right.add(&b);

        assert_eq!(left.merge(right), sequential);
        assert_eq!(sequential.total_searches, 12);
        assert_eq!(sequential.total_users, 2);
    }

    #[test]
    fn test_rollup_saturates() {
        let mut rollup = UsageRollup::default();
        rollup.add(&usage(u64::MAX, 1, 0, 0));
        assert_eq!(rollup.total_searches, u64::MAX);
    }
}
