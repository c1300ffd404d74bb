use std::collections::BTreeSet;

use csv::StringRecord;
use energy_domain::{HourlyReading, ReadingType, UsageData};
use time::Duration;

use super::{
    decode::{decode_data_details, decode_header, decode_interval_data, decode_interval_event},
    records::{
        DataDetailsRecord, IntervalDataRecord, RecordKind, NEM12_VERSION, VARIABLE_QUALITY,
    },
    units::{kwh_multiplier, UnitConversionError},
};
use crate::pipeline::PipelineError;

/// Whether the reconstructor wants more rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    /// A 900 record was seen; the dataset is complete.
    Complete,
}

/// A supported 200 record and the stream it feeds.
#[derive(Debug)]
struct ActiveBlock {
    details: DataDetailsRecord,
    reading_type: ReadingType,
}

#[derive(Debug)]
struct OpenInterval {
    record: IntervalDataRecord,
    line: u64,
}

#[derive(Debug)]
enum BlockState {
    Idle { block: Option<ActiveBlock> },
    Accumulating {
        block: ActiveBlock,
        interval: OpenInterval,
    },
    /// The current 200 record has an unsupported suffix.
    Skipping,
}

/// Rebuilds hourly readings from NEM12 rows fed in file order.
///
/// A 300 record stays open until the next 200, 300 or 900 row so that any
/// 400 rows in between can adjust its quality before it is converted.
#[derive(Debug)]
pub struct IntervalReconstructor {
    state: BlockState,
    usage: UsageData,
    awaiting_first_row: bool,
}

impl Default for IntervalReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalReconstructor {
    pub fn new() -> Self {
        Self {
            state: BlockState::Idle { block: None },
            usage: UsageData::new(),
            awaiting_first_row: true,
        }
    }

    pub fn apply(&mut self, record: &StringRecord, line: u64) -> Result<Progress, PipelineError> {
        let Some(indicator) = record.get(0).map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Progress::Continue);
        };
        let first_row = std::mem::replace(&mut self.awaiting_first_row, false);

        let code: u16 = match indicator.parse() {
            Ok(code) => code,
            Err(_) => {
                tracing::warn!(line, indicator, "could not parse record indicator, skipping row");
                metrics::counter!("nem12_rows_skipped_total").increment(1);
                return Ok(Progress::Continue);
            }
        };

        match RecordKind::from_code(code) {
            Some(RecordKind::Header) if first_row => self.on_header(record, line)?,
            Some(RecordKind::Header) => {
                tracing::warn!(line, "header record after the first row, ignoring");
                metrics::counter!("nem12_rows_skipped_total").increment(1);
            }
            Some(RecordKind::DataDetails) => self.on_data_details(record, line)?,
            Some(RecordKind::IntervalData) => self.on_interval_data(record, line)?,
            Some(RecordKind::IntervalEvent) => self.on_interval_event(record, line)?,
            // Manual register reads; they carry no interval energy.
            Some(RecordKind::B2bDetails) => {}
            Some(RecordKind::EndOfData) => {
                self.close_interval();
                return Ok(Progress::Complete);
            }
            None => {
                tracing::warn!(line, code, "unrecognised record indicator");
                metrics::counter!("nem12_rows_skipped_total").increment(1);
            }
        }

        Ok(Progress::Continue)
    }

    /// Finalizes any open interval and hands back the dataset.
    pub fn finish(mut self) -> UsageData {
        self.close_interval();
        self.usage
    }

    fn on_header(&mut self, record: &StringRecord, line: u64) -> Result<(), PipelineError> {
        let header = decode_header(record).map_err(|source| PipelineError::Decode {
            line,
            record: RecordKind::Header.code(),
            source,
        })?;
        if header.version != NEM12_VERSION {
            return Err(PipelineError::NotNem12 {
                line,
                version: header.version,
            });
        }
        tracing::debug!(
            line,
            from = header.from_participant.as_deref().unwrap_or(""),
            to = header.to_participant.as_deref().unwrap_or(""),
            "parsed NEM12 header"
        );
        Ok(())
    }

    fn on_data_details(&mut self, record: &StringRecord, line: u64) -> Result<(), PipelineError> {
        self.close_interval();

        let details = decode_data_details(record).map_err(|source| PipelineError::Decode {
            line,
            record: RecordKind::DataDetails.code(),
            source,
        })?;

        match details.reading_type() {
            Some(reading_type) => {
                tracing::debug!(
                    line,
                    nmi = %details.nmi,
                    suffix = %reading_type,
                    interval_length = details.interval_length,
                    "parsed data details record"
                );
                self.usage.register(&details.nmi, reading_type);
                self.state = BlockState::Idle {
                    block: Some(ActiveBlock {
                        details,
                        reading_type,
                    }),
                };
            }
            None => {
                tracing::warn!(
                    line,
                    nmi = %details.nmi,
                    suffix = %details.nmi_suffix,
                    "unsupported NMI suffix, skipping block"
                );
                metrics::counter!("nem12_unsupported_blocks_total").increment(1);
                self.state = BlockState::Skipping;
            }
        }
        Ok(())
    }

    fn on_interval_data(&mut self, record: &StringRecord, line: u64) -> Result<(), PipelineError> {
        let block = match std::mem::replace(&mut self.state, BlockState::Skipping) {
            BlockState::Skipping => return Ok(()),
            BlockState::Idle { block: None } => {
                self.state = BlockState::Idle { block: None };
                return Err(PipelineError::State {
                    line,
                    message: "interval data record before any data details record".to_string(),
                });
            }
            BlockState::Idle { block: Some(block) } => block,
            BlockState::Accumulating { block, interval } => {
                self.finalize(&block, interval);
                block
            }
        };

        match decode_interval_data(record, block.details.interval_length) {
            Ok(interval) => {
                self.state = BlockState::Accumulating {
                    block,
                    interval: OpenInterval {
                        record: interval,
                        line,
                    },
                };
                Ok(())
            }
            Err(source) => {
                self.state = BlockState::Idle { block: Some(block) };
                Err(PipelineError::Decode {
                    line,
                    record: RecordKind::IntervalData.code(),
                    source,
                })
            }
        }
    }

    fn on_interval_event(&mut self, record: &StringRecord, line: u64) -> Result<(), PipelineError> {
        let interval = match &mut self.state {
            BlockState::Skipping => return Ok(()),
            BlockState::Idle { .. } => {
                return Err(PipelineError::State {
                    line,
                    message: "interval event record without an open interval data record"
                        .to_string(),
                })
            }
            BlockState::Accumulating { interval, .. } => interval,
        };

        let event = decode_interval_event(record).map_err(|source| PipelineError::Decode {
            line,
            record: RecordKind::IntervalEvent.code(),
            source,
        })?;
        let touched = interval
            .record
            .apply_event(&event)
            .map_err(|e| PipelineError::State {
                line,
                message: format!("{e} (interval data record on line {})", interval.line),
            })?;
        tracing::trace!(line, touched, method = %event.quality.method, "applied interval event");
        Ok(())
    }

    fn close_interval(&mut self) {
        self.state = match std::mem::replace(&mut self.state, BlockState::Skipping) {
            BlockState::Accumulating { block, interval } => {
                self.finalize(&block, interval);
                BlockState::Idle { block: Some(block) }
            }
            other => other,
        };
    }

    // An unsupported unit drops this record's readings only; parsing goes on.
    fn finalize(&mut self, block: &ActiveBlock, interval: OpenInterval) {
        match hourly_readings(&block.details, &interval.record) {
            Ok(readings) => {
                metrics::counter!("nem12_hourly_readings_total").increment(readings.len() as u64);
                self.usage
                    .extend(&block.details.nmi, block.reading_type, readings);
            }
            Err(e) => {
                tracing::error!(
                    line = interval.line,
                    nmi = %block.details.nmi,
                    error = %e,
                    "dropping interval data record"
                );
                metrics::counter!("nem12_intervals_dropped_total").increment(1);
            }
        }
    }
}

/// Converts one day of sub-interval values into 24 hourly readings.
pub fn hourly_readings(
    details: &DataDetailsRecord,
    interval: &IntervalDataRecord,
) -> Result<Vec<HourlyReading>, UnitConversionError> {
    let multiplier = kwh_multiplier(&details.unit_of_measure)?;
    let per_hour = details.values_per_hour();
    let midnight = interval.interval_date.midnight();

    let readings = interval
        .values
        .chunks(per_hour)
        .enumerate()
        .map(|(hour, chunk)| {
            let start = midnight + Duration::hours(hour as i64);
            let mut reading = HourlyReading {
                start,
                end: start + Duration::HOUR,
                energy_kwh: chunk.iter().map(|v| v.value).sum::<f64>() * multiplier,
                quality_methods: BTreeSet::new(),
                reason_codes: BTreeSet::new(),
                reason_descriptions: BTreeSet::new(),
            };

            let first = hour * per_hour;
            for (index, value) in (first..first + chunk.len()).zip(chunk) {
                let quality = interval.effective_quality(index);
                // A variable day takes its methods from the 400 overrides only.
                if value.quality.is_some() || quality.method != VARIABLE_QUALITY {
                    reading.quality_methods.insert(quality.method.clone());
                }
                if let Some(code) = quality.reason_code {
                    reading.reason_codes.insert(code);
                }
                if let Some(description) = &quality.reason_description {
                    reading.reason_descriptions.insert(description.clone());
                }
            }
            reading
        })
        .collect();

    Ok(readings)
}
