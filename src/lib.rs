pub mod args;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod merger;
pub mod output;
pub mod pipeline;
pub mod planner;
pub mod scanner;
pub mod serializer;
pub mod spool;
pub mod stats;
pub mod utils;

pub use args::Args;
pub use config::{PipelineConfig, Transfer};
pub use error::{PipelineError, Result};
pub use extract::{FieldExtractor, FixedOffsetExtractor, RegexExtractor};
pub use pipeline::{aggregate, run};
pub use planner::ByteRange;
pub use stats::{Aggregate, ChunkAggregate, MergedResult, RunSummary};
