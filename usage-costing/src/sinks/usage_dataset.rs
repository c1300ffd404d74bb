use csv::StringRecord;
use energy_domain::UsageData;
use futures::StreamExt;

use crate::{
    nem12::{IntervalReconstructor, Progress},
    pipeline::{Envelope, PipelineError, Sink},
};

/// Folds NEM12 rows into a [`UsageData`] set.
///
/// Reading stops at the end-of-data record. Dropping the input stream at that
/// point releases the reader, so trailing rows are never read.
#[derive(Debug, Default, Clone, Copy)]
pub struct UsageDatasetSink;

impl UsageDatasetSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Sink<StringRecord> for UsageDatasetSink {
    type Output = UsageData;

    async fn run<S>(&self, mut input: S) -> Result<UsageData, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<StringRecord>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut reconstructor = IntervalReconstructor::new();
        let mut rows: u64 = 0;

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    tracing::error!(error = %e, "error in upstream pipeline for UsageDatasetSink");
                    return Err(e);
                }
            };
            rows += 1;

            if reconstructor.apply(&env.payload, env.line)? == Progress::Complete {
                let usage = reconstructor.finish();
                tracing::info!(rows, nmis = usage.len(), "reached end of NEM12 data");
                return Ok(usage);
            }
        }

        tracing::warn!(rows, "NEM12 input ended without an end-of-data record");
        metrics::counter!("nem12_missing_end_of_data_total").increment(1);
        Ok(reconstructor.finish())
    }
}
