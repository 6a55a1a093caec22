//! Product search: slot text to numeric filters, filters to a typed plan.

pub mod filter;
pub mod numeric;
pub mod plan;

pub use filter::{
    BoundKind, Dimension, FilterResolver, FilterSet, PriceOrder, Qualifier, QualifierThresholds,
    SlotInput,
};
pub use plan::{
    Bound, NameResolution, PlanError, PlanOptions, Predicate, SearchPlan, SearchPlanBuilder,
    UnparsedSpec, VariantMetrics,
};
