use energy_domain::{Nmi, ReadingType};
use time::{Date, PrimitiveDateTime};

use super::error::EventRangeError;

/// Version literal carried by the 100 record of a NEM12 file.
pub const NEM12_VERSION: &str = "NEM12";

/// Quality method placeholder meaning "see the 400 records for this day".
pub const VARIABLE_QUALITY: &str = "V";

pub const MINUTES_PER_DAY: u16 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Header,
    DataDetails,
    IntervalData,
    IntervalEvent,
    B2bDetails,
    EndOfData,
}

impl RecordKind {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            100 => Some(RecordKind::Header),
            200 => Some(RecordKind::DataDetails),
            300 => Some(RecordKind::IntervalData),
            400 => Some(RecordKind::IntervalEvent),
            500 => Some(RecordKind::B2bDetails),
            900 => Some(RecordKind::EndOfData),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            RecordKind::Header => 100,
            RecordKind::DataDetails => 200,
            RecordKind::IntervalData => 300,
            RecordKind::IntervalEvent => 400,
            RecordKind::B2bDetails => 500,
            RecordKind::EndOfData => 900,
        }
    }
}

/// Header record (100).
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    pub version: String,
    pub created_at: Option<PrimitiveDateTime>,
    pub from_participant: Option<String>,
    pub to_participant: Option<String>,
}

/// NMI data details record (200). Governs every 300/400 row until the next 200.
#[derive(Debug, Clone, PartialEq)]
pub struct DataDetailsRecord {
    pub nmi: Nmi,
    pub nmi_configuration: Option<String>,
    pub register_id: Option<String>,
    pub nmi_suffix: String,
    pub mdm_data_stream_identifier: Option<String>,
    pub meter_serial_number: Option<String>,
    pub unit_of_measure: String,
    pub interval_length: u16,
    pub next_scheduled_read_date: Option<Date>,
}

impl DataDetailsRecord {
    pub fn reading_type(&self) -> Option<ReadingType> {
        ReadingType::from_suffix(&self.nmi_suffix)
    }

    pub fn values_per_day(&self) -> usize {
        usize::from(MINUTES_PER_DAY / self.interval_length)
    }

    pub fn values_per_hour(&self) -> usize {
        usize::from(60 / self.interval_length)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quality {
    pub method: String,
    pub reason_code: Option<u16>,
    pub reason_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalValue {
    pub value: f64,
    /// Set when a 400 record overrides the day's default quality.
    pub quality: Option<Quality>,
}

/// Interval data record (300): one day of sub-interval values.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalDataRecord {
    pub interval_date: Date,
    pub values: Vec<IntervalValue>,
    pub quality: Quality,
    pub updated_at: Option<PrimitiveDateTime>,
    pub msats_loaded_at: Option<PrimitiveDateTime>,
}

impl IntervalDataRecord {
    /// Overrides the quality of the 1-indexed, inclusive range named by the
    /// event. Returns how many values were touched.
    pub fn apply_event(&mut self, event: &IntervalEventRecord) -> Result<usize, EventRangeError> {
        let available = self.values.len();
        let (start, end) = (event.start_interval, event.end_interval);
        if start == 0 || start > end || end > available {
            return Err(EventRangeError {
                start,
                end,
                available,
            });
        }

        for value in &mut self.values[start - 1..end] {
            value.quality = Some(event.quality.clone());
        }
        Ok(end - start + 1)
    }

    /// Quality in force for the value at `index` (0-based).
    pub fn effective_quality(&self, index: usize) -> &Quality {
        self.values
            .get(index)
            .and_then(|v| v.quality.as_ref())
            .unwrap_or(&self.quality)
    }
}

/// Interval event record (400).
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalEventRecord {
    pub start_interval: usize,
    pub end_interval: usize,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn day(count: usize) -> IntervalDataRecord {
        IntervalDataRecord {
            interval_date: date!(2024-01-01),
            values: (0..count)
                .map(|_| IntervalValue {
                    value: 0.5,
                    quality: None,
                })
                .collect(),
            quality: Quality {
                method: VARIABLE_QUALITY.to_string(),
                reason_code: None,
                reason_description: None,
            },
            updated_at: None,
            msats_loaded_at: None,
        }
    }

    fn event(start: usize, end: usize) -> IntervalEventRecord {
        IntervalEventRecord {
            start_interval: start,
            end_interval: end,
            quality: Quality {
                method: "E52".to_string(),
                reason_code: Some(53),
                reason_description: Some("estimated".to_string()),
            },
        }
    }

    #[test]
    fn event_touches_exactly_the_inclusive_range() {
        let mut record = day(48);
        let touched = record.apply_event(&event(5, 12)).unwrap();
        assert_eq!(touched, 8);

        let overridden: Vec<usize> = record
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.quality.is_some())
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(overridden, (5..=12).collect::<Vec<_>>());
    }

    #[test]
    fn event_covering_the_last_interval_is_accepted() {
        let mut record = day(48);
        assert_eq!(record.apply_event(&event(48, 48)), Ok(1));
        assert_eq!(record.effective_quality(47).reason_code, Some(53));
        assert_eq!(record.effective_quality(46).method, VARIABLE_QUALITY);
    }

    #[test]
    fn event_outside_the_day_is_rejected_without_changes() {
        let mut record = day(48);
        assert!(record.apply_event(&event(0, 2)).is_err());
        assert!(record.apply_event(&event(47, 49)).is_err());
        assert!(record.apply_event(&event(10, 9)).is_err());
        assert!(record.values.iter().all(|v| v.quality.is_none()));
    }

    #[test]
    fn record_kind_codes_round_trip() {
        for code in [100, 200, 300, 400, 500, 900] {
            assert_eq!(RecordKind::from_code(code).map(RecordKind::code), Some(code));
        }
        assert_eq!(RecordKind::from_code(250), None);
    }
}
