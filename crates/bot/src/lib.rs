pub mod filter;
pub mod metrics;
pub mod pipeline;

pub use filter::TargetFilter;
pub use pipeline::Bot;
