use energy_domain::{HourlyReading, TariffPeriod};
use time::{util::days_in_year_month, PrimitiveDateTime, Time};

use super::{
    tariff::{MonthDay, RateSchedule, TariffWindow},
    with_gst, MonthlyCost, PricingError,
};

// Months with fewer observed days than this are not extrapolated.
const MIN_DAYS_FOR_EXTRAPOLATION: u8 = 14;

/// A tariff period with every price parsed and validated.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedPeriod {
    pub index: usize,
    pub window: TariffWindow,
    /// GST-inclusive.
    pub daily_supply: f64,
    pub rates: RateSchedule,
}

impl PricedPeriod {
    pub fn from_plan(index: usize, period: &TariffPeriod) -> Result<Self, PricingError> {
        let window = TariffWindow {
            start: parse_month_day(index, "startDate", &period.start_date)?,
            end: parse_month_day(index, "endDate", &period.end_date)?,
        };

        let supply = period
            .daily_supply_charges
            .as_deref()
            .ok_or(PricingError::MissingSupplyCharge { period: index })?;
        let daily_supply = supply
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|charge| charge.is_finite())
            .ok_or_else(|| PricingError::InvalidSupplyCharge {
                period: index,
                value: supply.to_string(),
            })?;

        let single_rate = period
            .single_rate
            .as_ref()
            .ok_or(PricingError::MissingSingleRate { period: index })?;
        let rates = RateSchedule::from_entries(index, &single_rate.rates)?;

        Ok(Self {
            index,
            window,
            daily_supply: with_gst(daily_supply),
            rates,
        })
    }

    fn applies_to(&self, reading: &HourlyReading) -> bool {
        self.window.contains(MonthDay::of(reading.start.date()))
    }
}

fn parse_month_day(period: usize, field: &'static str, value: &str) -> Result<MonthDay, PricingError> {
    MonthDay::parse(value).ok_or_else(|| PricingError::InvalidDate {
        period,
        field,
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Clone, Copy)]
struct DayTally {
    charge: f64,
    kwh: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct MonthTally {
    charge: f64,
    days: u8,
}

impl MonthTally {
    /// The month's charge scaled up to `days_in_month`, or `None` when too
    /// few days were observed to say anything.
    fn settle(&self, days_in_month: u8) -> Option<f64> {
        if self.days >= days_in_month {
            return Some(self.charge);
        }
        if self.days < MIN_DAYS_FOR_EXTRAPOLATION {
            return None;
        }
        let daily_average = self.charge / f64::from(self.days);
        Some(self.charge + daily_average * f64::from(days_in_month - self.days))
    }
}

/// Settled month totals per calendar month, January first.
#[derive(Debug, Default)]
struct MonthBuckets {
    totals: [f64; 12],
    counts: [u32; 12],
}

impl MonthBuckets {
    fn add(&mut self, month_index: usize, charge: f64) {
        self.totals[month_index] += charge;
        self.counts[month_index] += 1;
    }

    fn into_cost(self) -> MonthlyCost {
        let mut average_per_month = [0.0; 12];
        let mut populated = 0u32;
        let mut sum = 0.0;
        for (month, (total, count)) in self.totals.iter().zip(self.counts).enumerate() {
            if count == 0 {
                continue;
            }
            average_per_month[month] = total / f64::from(count);
            sum += average_per_month[month];
            populated += 1;
        }

        let average_monthly = if populated == 0 {
            tracing::warn!("no month had enough usage to price, reporting zero cost");
            0.0
        } else {
            sum / f64::from(populated)
        };

        MonthlyCost {
            average_monthly,
            average_per_month,
        }
    }
}

fn is_midnight(at: PrimitiveDateTime) -> bool {
    at.time() == Time::MIDNIGHT
}

/// Prices `readings` under one tariff period, adding every finished month
/// to `buckets`.
///
/// Day and month accumulators live for one period walk only.
fn accumulate_period(
    period: &PricedPeriod,
    readings: &[HourlyReading],
    buckets: &mut MonthBuckets,
) {
    let mut day = DayTally::default();
    let mut month = MonthTally::default();

    for reading in readings.iter().filter(|r| period.applies_to(r)) {
        if is_midnight(reading.start) {
            day = DayTally {
                charge: period.daily_supply,
                kwh: 0.0,
            };
        }

        day.kwh += reading.energy_kwh;
        day.charge += reading.energy_kwh * period.rates.unit_price(day.kwh);

        if !is_midnight(reading.end) {
            continue;
        }

        if reading.start.day() == 1 {
            month = MonthTally::default();
        }
        month.charge += day.charge;
        month.days = month.days.saturating_add(1);

        if reading.end.day() == 1 {
            let start = reading.start.date();
            let days_in_month = days_in_year_month(start.year(), start.month());
            match month.settle(days_in_month) {
                Some(charge) => {
                    buckets.add(usize::from(u8::from(start.month())) - 1, charge);
                }
                None => {
                    tracing::debug!(
                        period = period.index,
                        month = %start.month(),
                        year = start.year(),
                        days = month.days,
                        "too few days of usage, month discarded"
                    );
                }
            }
        }
    }
}

/// Single-rate monthly estimate over every period of the plan.
pub fn calculate(
    periods: &[TariffPeriod],
    readings: &[HourlyReading],
) -> Result<MonthlyCost, PricingError> {
    let priced = periods
        .iter()
        .enumerate()
        .map(|(index, period)| PricedPeriod::from_plan(index, period))
        .collect::<Result<Vec<_>, _>>()?;

    let mut buckets = MonthBuckets::default();
    for period in &priced {
        accumulate_period(period, readings, &mut buckets);
    }
    Ok(buckets.into_cost())
}
