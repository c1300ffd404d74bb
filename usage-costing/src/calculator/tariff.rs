use energy_domain::RateEntry;
use time::{macros::format_description, Date};

use super::{with_gst, PricingError};

// Leap year, so 02-29 is a legal window boundary.
const REFERENCE_YEAR: i32 = 2000;

/// A year-agnostic calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
    pub month: u8,
    pub day: u8,
}

impl MonthDay {
    /// Parses `MM-DD`, two digits each.
    pub fn parse(value: &str) -> Option<Self> {
        let dated = format!("{REFERENCE_YEAR}-{value}");
        Date::parse(&dated, format_description!("[year]-[month]-[day]"))
            .ok()
            .map(Self::of)
    }

    pub fn of(date: Date) -> Self {
        Self {
            month: u8::from(date.month()),
            day: date.day(),
        }
    }
}

/// Inclusive day window of a tariff period. A start after the end wraps
/// across new year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TariffWindow {
    pub start: MonthDay,
    pub end: MonthDay,
}

impl TariffWindow {
    pub fn contains(&self, day: MonthDay) -> bool {
        if self.start > self.end {
            day >= self.start || day <= self.end
        } else {
            self.start <= day && day <= self.end
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bracket {
    upper_kwh: f64,
    unit_price: f64,
}

/// Consumption brackets of a single-rate tariff, in plan order.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSchedule {
    bounded: Vec<Bracket>,
    remaining_price: f64,
}

impl RateSchedule {
    /// Validates the bracket list of period `period`. Every unit price must
    /// parse and exactly the last entry must be unbounded.
    pub fn from_entries(period: usize, entries: &[RateEntry]) -> Result<Self, PricingError> {
        let Some((last, bounded)) = entries.split_last() else {
            return Err(PricingError::EmptyRates { period });
        };

        let mut brackets = Vec::with_capacity(bounded.len());
        for (bracket, entry) in bounded.iter().enumerate() {
            let unit_price = parse_unit_price(period, bracket, entry)?;
            let Some(upper_kwh) = entry.volume else {
                return Err(PricingError::MisplacedRemainderBracket { period, bracket });
            };
            brackets.push(Bracket {
                upper_kwh,
                unit_price,
            });
        }

        let remaining_price = parse_unit_price(period, bounded.len(), last)?;
        if last.volume.is_some() {
            return Err(PricingError::MissingRemainderBracket { period });
        }

        Ok(Self {
            bounded: brackets,
            remaining_price,
        })
    }

    /// GST-inclusive price for energy that brings the day's total to
    /// `cumulative_kwh`. The whole reading is priced in that one bracket.
    pub fn unit_price(&self, cumulative_kwh: f64) -> f64 {
        let price = self
            .bounded
            .iter()
            .find(|b| cumulative_kwh < b.upper_kwh)
            .map_or(self.remaining_price, |b| b.unit_price);
        with_gst(price)
    }
}

fn parse_unit_price(period: usize, bracket: usize, entry: &RateEntry) -> Result<f64, PricingError> {
    entry
        .unit_price
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .ok_or_else(|| PricingError::InvalidUnitPrice {
            period,
            bracket,
            value: entry.unit_price.clone(),
        })
}
