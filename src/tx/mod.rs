//! Replacement transaction queries with gas price tiers

mod gas;
mod replacement;

pub use gas::GasEstimator;
pub use replacement::{QueryBuilder, ReplacementIntent, ReplacementParameters};
