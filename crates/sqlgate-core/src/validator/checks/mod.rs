//! Structural checks, one module per pipeline stage.

mod aggregation;
mod allowlist;
mod ambiguity;
mod cross_db;
mod cross_join;
mod determinism;
mod row_cap;
mod select_into;
mod system_objects;

use super::rule::CheckRule;

pub use aggregation::AggregationConsistency;
pub use allowlist::AllowlistMembership;
pub use ambiguity::UnqualifiedColumns;
pub use cross_db::CrossDatabaseReferences;
pub use cross_join::UnrestrictedCrossJoin;
pub use determinism::PagingRequiresOrderBy;
pub use row_cap::FetchSizeCap;
pub use select_into::SelectIntoTarget;
pub use system_objects::SystemObjectReferences;

/// All structural checks in pipeline order. The order is part of the
/// validator's contract: issue ordering in results follows it.
pub fn all_checks() -> Vec<Box<dyn CheckRule>> {
    vec![
        Box::new(SelectIntoTarget),
        Box::new(AllowlistMembership),
        Box::new(SystemObjectReferences),
        Box::new(CrossDatabaseReferences),
        Box::new(PagingRequiresOrderBy),
        Box::new(UnqualifiedColumns),
        Box::new(AggregationConsistency),
        Box::new(FetchSizeCap),
        Box::new(UnrestrictedCrossJoin),
    ]
}
