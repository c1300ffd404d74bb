pub mod pipeline;
pub mod config;
pub mod nem12;
pub mod sources;
pub mod sinks;
pub mod calculator;
pub mod usage_parser;
pub mod observability;

pub use calculator::{calculate_monthly, MonthlyCost, PricingError};
pub use pipeline::{Envelope, Pipeline, PipelineError};
pub use usage_parser::{parse_usage_file, parse_usage_reader};
