use std::{io::Read, path::Path};

use energy_domain::UsageData;

use crate::{
    config::SourceConfig,
    pipeline::{Pipeline, PipelineError},
    sinks::UsageDatasetSink,
    sources::Nem12FileSource,
};

/// Parses a NEM12 file into hourly usage.
pub async fn parse_usage_file<P: AsRef<Path>>(
    path: P,
    cfg: &SourceConfig,
) -> Result<UsageData, PipelineError> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "parsing NEM12 file");
    let source = Nem12FileSource::new(path, cfg.channel_capacity).with_delimiter(cfg.delimiter_byte());
    run(source).await
}

/// Parses NEM12 content from any reader, e.g. an upload held in memory.
pub async fn parse_usage_reader<R: Read + Send + 'static>(
    reader: R,
    cfg: &SourceConfig,
) -> Result<UsageData, PipelineError> {
    let source =
        Nem12FileSource::from_reader(reader, cfg.channel_capacity).with_delimiter(cfg.delimiter_byte());
    run(source).await
}

async fn run(source: Nem12FileSource) -> Result<UsageData, PipelineError> {
    let usage = Pipeline::new(source, UsageDatasetSink::new()).run().await?;
    tracing::info!(nmis = usage.len(), "parsed usage data");
    Ok(usage)
}
