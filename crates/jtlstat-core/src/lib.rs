pub mod engine;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod sample;
pub mod schema;

pub use engine::{Aggregator, EngineConfig, MalformedLinePolicy};
pub use error::JtlError;
pub use report::{LabelSummary, Report};
pub use sample::Sample;
pub use schema::Schema;
