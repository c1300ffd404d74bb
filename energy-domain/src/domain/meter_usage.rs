use std::{collections::BTreeSet, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

time::serde::format_description!(
    reading_timestamp,
    PrimitiveDateTime,
    "[year]-[month]-[day]T[hour]:[minute]:[second]"
);

/// National Metering Identifier. Unique for each connection point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nmi(String);

impl Nmi {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nmi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Nmi {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Kind of interval data a block describes, mapped from the NMI suffix.
///
/// Suffixes are interpreted broadly: any `E1` stream is treated as general
/// usage even on sites where the register layout is more nuanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReadingType {
    #[serde(rename = "E1")]
    GeneralUsage,
    #[serde(rename = "E2")]
    ControlledLoad,
    #[serde(rename = "B1")]
    PrimaryExport,
    #[serde(rename = "B2")]
    SecondaryExport,
}

impl ReadingType {
    pub const ALL: [ReadingType; 4] = [
        ReadingType::GeneralUsage,
        ReadingType::ControlledLoad,
        ReadingType::PrimaryExport,
        ReadingType::SecondaryExport,
    ];

    /// Returns `None` for suffixes outside the supported set.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rt| rt.suffix() == suffix)
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ReadingType::GeneralUsage => "E1",
            ReadingType::ControlledLoad => "E2",
            ReadingType::PrimaryExport => "B1",
            ReadingType::SecondaryExport => "B2",
        }
    }
}

impl fmt::Display for ReadingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// One clock hour of energy for a single stream.
///
/// An hour is built from several sub-interval measurements which may carry
/// different quality methods and reasons, so all of them are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyReading {
    #[serde(with = "reading_timestamp")]
    pub start: PrimitiveDateTime,
    #[serde(with = "reading_timestamp")]
    pub end: PrimitiveDateTime,
    pub energy_kwh: f64,
    pub quality_methods: BTreeSet<String>,
    pub reason_codes: BTreeSet<u16>,
    pub reason_descriptions: BTreeSet<String>,
}

/// Hourly readings per metering point and stream, in the order they were
/// produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageData {
    points: IndexMap<Nmi, IndexMap<ReadingType, Vec<HourlyReading>>>,
}

impl UsageData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures an entry exists for the pair, leaving existing readings alone.
    pub fn register(&mut self, nmi: &Nmi, reading_type: ReadingType) {
        self.points
            .entry(nmi.clone())
            .or_default()
            .entry(reading_type)
            .or_default();
    }

    pub fn extend<I>(&mut self, nmi: &Nmi, reading_type: ReadingType, readings: I)
    where
        I: IntoIterator<Item = HourlyReading>,
    {
        self.points
            .entry(nmi.clone())
            .or_default()
            .entry(reading_type)
            .or_default()
            .extend(readings);
    }

    pub fn readings(&self, nmi: &Nmi, reading_type: ReadingType) -> &[HourlyReading] {
        self.points
            .get(nmi)
            .and_then(|streams| streams.get(&reading_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn streams(&self, nmi: &Nmi) -> Option<&IndexMap<ReadingType, Vec<HourlyReading>>> {
        self.points.get(nmi)
    }

    /// Metering points in first-seen order.
    pub fn nmis(&self) -> impl Iterator<Item = &Nmi> {
        self.points.keys()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn reading(start: PrimitiveDateTime, kwh: f64) -> HourlyReading {
        HourlyReading {
            start,
            end: start + time::Duration::HOUR,
            energy_kwh: kwh,
            quality_methods: BTreeSet::new(),
            reason_codes: BTreeSet::new(),
            reason_descriptions: BTreeSet::new(),
        }
    }

    #[test]
    fn reading_type_maps_only_supported_suffixes() {
        assert_eq!(ReadingType::from_suffix("E1"), Some(ReadingType::GeneralUsage));
        assert_eq!(ReadingType::from_suffix("B2"), Some(ReadingType::SecondaryExport));
        assert_eq!(ReadingType::from_suffix("Q1"), None);
        assert_eq!(ReadingType::from_suffix("e1"), None);
    }

    #[test]
    fn nmis_keep_first_seen_order() {
        let mut usage = UsageData::new();
        usage.register(&Nmi::from("NMI2"), ReadingType::GeneralUsage);
        usage.register(&Nmi::from("NMI1"), ReadingType::GeneralUsage);
        usage.register(&Nmi::from("NMI2"), ReadingType::PrimaryExport);

        let order: Vec<&str> = usage.nmis().map(Nmi::as_str).collect();
        assert_eq!(order, vec!["NMI2", "NMI1"]);
        assert_eq!(usage.len(), 2);
    }

    #[test]
    fn register_does_not_clear_existing_readings() {
        let nmi = Nmi::from("NMI1");
        let mut usage = UsageData::new();
        usage.extend(
            &nmi,
            ReadingType::GeneralUsage,
            vec![reading(datetime!(2024-01-01 00:00), 1.5)],
        );
        usage.register(&nmi, ReadingType::GeneralUsage);

        assert_eq!(usage.readings(&nmi, ReadingType::GeneralUsage).len(), 1);
        assert!(usage.readings(&nmi, ReadingType::ControlledLoad).is_empty());
    }

    #[test]
    fn usage_serializes_with_suffix_keys_and_iso_timestamps() {
        let nmi = Nmi::from("NMI1");
        let mut usage = UsageData::new();
        usage.extend(
            &nmi,
            ReadingType::GeneralUsage,
            vec![reading(datetime!(2024-03-01 13:00), 0.25)],
        );

        let json = serde_json::to_value(&usage).unwrap();
        let first = &json["NMI1"]["E1"][0];
        assert_eq!(first["start"], "2024-03-01T13:00:00");
        assert_eq!(first["end"], "2024-03-01T14:00:00");
        assert_eq!(first["energy_kwh"], 0.25);
    }
}
