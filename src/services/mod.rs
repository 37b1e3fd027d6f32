//! Services for usage aggregation, plan state and cached dashboard views

pub mod aggregator;
pub mod cache;
pub mod dashboard;
pub mod lookup;
pub mod plan;

pub use aggregator::{Aggregator, ExclusionList};
pub use cache::TtlCache;
pub use dashboard::{Dashboard, PopulationOverview, UserOverview};
