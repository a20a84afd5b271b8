pub mod condition;

pub use condition::{CompareOp, Condition, strip_parens};
