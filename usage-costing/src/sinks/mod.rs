pub mod usage_dataset;

pub use usage_dataset::UsageDatasetSink;
