pub mod analysis;
pub mod fact;
pub mod lot;
pub mod machine;
pub mod recommendation;

pub use analysis::*;
pub use fact::*;
pub use lot::*;
pub use machine::*;
pub use recommendation::*;
