//! Stateless decoding of single NEM12 rows into typed records.
//!
//! Field positions follow the NEM12 layout. Empty fields count as absent:
//! a missing mandatory field is an error, a missing optional one is `None`.

use std::{fmt::Display, str::FromStr};

use csv::StringRecord;
use energy_domain::Nmi;
use time::{macros::format_description, Date, PrimitiveDateTime};

use super::{
    error::DecodeError,
    records::{
        DataDetailsRecord, HeaderRecord, IntervalDataRecord, IntervalEventRecord, IntervalValue,
        Quality, MINUTES_PER_DAY,
    },
};

fn field(record: &StringRecord, index: usize) -> Option<&str> {
    record.get(index).map(str::trim).filter(|s| !s.is_empty())
}

fn required<'r>(
    record: &'r StringRecord,
    index: usize,
    name: &'static str,
) -> Result<&'r str, DecodeError> {
    field(record, index).ok_or(DecodeError::MissingField { field: name })
}

fn optional_string(record: &StringRecord, index: usize) -> Option<String> {
    field(record, index).map(str::to_string)
}

fn parse_value<T>(value: &str, name: &'static str) -> Result<T, DecodeError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| DecodeError::InvalidField {
        field: name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_required<T>(record: &StringRecord, index: usize, name: &'static str) -> Result<T, DecodeError>
where
    T: FromStr,
    T::Err: Display,
{
    parse_value(required(record, index, name)?, name)
}

fn parse_optional<T>(
    record: &StringRecord,
    index: usize,
    name: &'static str,
) -> Result<Option<T>, DecodeError>
where
    T: FromStr,
    T::Err: Display,
{
    field(record, index)
        .map(|value| parse_value(value, name))
        .transpose()
}

fn invalid(name: &'static str, value: &str, reason: impl Display) -> DecodeError {
    DecodeError::InvalidField {
        field: name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// `YYYYMMDD`
fn parse_date(value: &str, name: &'static str) -> Result<Date, DecodeError> {
    Date::parse(value, format_description!("[year][month][day]"))
        .map_err(|e| invalid(name, value, e))
}

/// `YYYYMMDDhhmm`
fn parse_minute_timestamp(value: &str, name: &'static str) -> Result<PrimitiveDateTime, DecodeError> {
    PrimitiveDateTime::parse(value, format_description!("[year][month][day][hour][minute]"))
        .map_err(|e| invalid(name, value, e))
}

/// `YYYYMMDDhhmmss`
fn parse_second_timestamp(value: &str, name: &'static str) -> Result<PrimitiveDateTime, DecodeError> {
    PrimitiveDateTime::parse(
        value,
        format_description!("[year][month][day][hour][minute][second]"),
    )
    .map_err(|e| invalid(name, value, e))
}

/// Decodes a 100 record. The version literal is returned as found; checking
/// it against `NEM12` is the caller's decision.
pub fn decode_header(record: &StringRecord) -> Result<HeaderRecord, DecodeError> {
    let version = required(record, 1, "VersionHeader")?.to_string();
    let created_at = field(record, 2)
        .map(|v| parse_minute_timestamp(v, "DateTime"))
        .transpose()?;

    Ok(HeaderRecord {
        version,
        created_at,
        from_participant: optional_string(record, 3),
        to_participant: optional_string(record, 4),
    })
}

/// Decodes a 200 record.
pub fn decode_data_details(record: &StringRecord) -> Result<DataDetailsRecord, DecodeError> {
    let nmi = Nmi::new(required(record, 1, "NMI")?);
    let nmi_suffix = required(record, 4, "NMISuffix")?.to_string();
    let unit_of_measure = required(record, 7, "UOM")?.to_string();

    let interval_length: u16 = parse_required(record, 8, "IntervalLength")?;
    // Hourly aggregation needs whole sub-intervals per hour, which also
    // guarantees an even split of the day.
    if interval_length == 0 || 60 % interval_length != 0 {
        return Err(invalid(
            "IntervalLength",
            &interval_length.to_string(),
            "must be a positive divisor of 60",
        ));
    }

    let next_scheduled_read_date = field(record, 9)
        .map(|v| parse_date(v, "NextScheduledReadDate"))
        .transpose()?;

    Ok(DataDetailsRecord {
        nmi,
        nmi_configuration: optional_string(record, 2),
        register_id: optional_string(record, 3),
        nmi_suffix,
        mdm_data_stream_identifier: optional_string(record, 5),
        meter_serial_number: optional_string(record, 6),
        unit_of_measure,
        interval_length,
        next_scheduled_read_date,
    })
}

/// Decodes a 300 record against the interval length of the active 200 record.
pub fn decode_interval_data(
    record: &StringRecord,
    interval_length: u16,
) -> Result<IntervalDataRecord, DecodeError> {
    let interval_date = parse_date(required(record, 1, "IntervalDate")?, "IntervalDate")?;

    let expected = usize::from(MINUTES_PER_DAY / interval_length.max(1));
    let first_value = 2;
    let after_values = first_value + expected;
    if record.len() < after_values {
        return Err(DecodeError::NotEnoughValues {
            expected,
            found: record.len().saturating_sub(first_value),
        });
    }

    let values = (first_value..after_values)
        .map(|index| -> Result<IntervalValue, DecodeError> {
            let value: f64 = parse_required(record, index, "IntervalValue")?;
            if !value.is_finite() {
                return Err(invalid("IntervalValue", &value.to_string(), "must be a finite number"));
            }
            Ok(IntervalValue {
                value,
                quality: None,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let quality = Quality {
        method: required(record, after_values, "QualityMethod")?.to_string(),
        reason_code: parse_optional(record, after_values + 1, "ReasonCode")?,
        reason_description: optional_string(record, after_values + 2),
    };

    let updated_at = field(record, after_values + 3)
        .map(|v| parse_second_timestamp(v, "UpdateDateTime"))
        .transpose()?;
    let msats_loaded_at = field(record, after_values + 4)
        .map(|v| parse_second_timestamp(v, "MSATSLoadDateTime"))
        .transpose()?;

    Ok(IntervalDataRecord {
        interval_date,
        values,
        quality,
        updated_at,
        msats_loaded_at,
    })
}

/// Decodes a 400 record. Range bounds are checked when the event is applied.
pub fn decode_interval_event(record: &StringRecord) -> Result<IntervalEventRecord, DecodeError> {
    Ok(IntervalEventRecord {
        start_interval: parse_required(record, 1, "StartInterval")?,
        end_interval: parse_required(record, 2, "EndInterval")?,
        quality: Quality {
            method: required(record, 3, "QualityMethod")?.to_string(),
            reason_code: parse_optional(record, 4, "ReasonCode")?,
            reason_description: optional_string(record, 5),
        },
    })
}
