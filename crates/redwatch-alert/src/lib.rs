pub mod builder;
pub mod evaluator;
pub mod prepared;

pub use builder::AlertRecordBuilder;
pub use evaluator::{EqualityBasis, RuleEvaluator};
pub use prepared::PreparedRule;
