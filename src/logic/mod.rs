pub mod host;
pub mod normalizer;
pub mod rules;

pub use host::EvaluationHost;
pub use rules::RulesEngine;
