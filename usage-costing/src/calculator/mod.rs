//! Monthly cost estimates for reconstructed usage under a retail plan.

pub mod single_rate;
pub mod tariff;

use energy_domain::{EnergyPlanDetail, Nmi, PricingModel, ReadingType, UsageData};
use serde::Serialize;

pub use single_rate::PricedPeriod;
pub use tariff::{MonthDay, RateSchedule, TariffWindow};

/// Australian GST, applied to every supply charge and unit price.
pub const GST_MULTIPLIER: f64 = 1.1;

pub fn with_gst(amount: f64) -> f64 {
    amount * GST_MULTIPLIER
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCost {
    /// Mean of every calendar month that could be priced.
    pub average_monthly: f64,
    /// January first. Zero for months without enough usage.
    pub average_per_month: [f64; 12],
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("tariff period {period}: invalid {field} '{value}', expected MM-DD")]
    InvalidDate {
        period: usize,
        field: &'static str,
        value: String,
    },
    #[error("tariff period {period}: no daily supply charge")]
    MissingSupplyCharge { period: usize },
    #[error("tariff period {period}: invalid daily supply charge '{value}'")]
    InvalidSupplyCharge { period: usize, value: String },
    #[error("tariff period {period}: no single rate block")]
    MissingSingleRate { period: usize },
    #[error("tariff period {period}: single rate has no rates")]
    EmptyRates { period: usize },
    #[error("tariff period {period}: rate {bracket} has invalid unit price '{value}'")]
    InvalidUnitPrice {
        period: usize,
        bracket: usize,
        value: String,
    },
    #[error("tariff period {period}: no rate without a volume for the remaining energy")]
    MissingRemainderBracket { period: usize },
    #[error("tariff period {period}: rate {bracket} has no volume but is not the last rate")]
    MisplacedRemainderBracket { period: usize, bracket: usize },
    #[error("unsupported pricing model {0:?}")]
    UnsupportedPricingModel(PricingModel),
    #[error("time of use pricing is not implemented")]
    TimeOfUseUnimplemented,
    #[error("usage data has no metering points")]
    NoUsage,
}

/// Estimates the average monthly bill of `usage` under `plan`.
pub fn calculate_monthly(
    usage: &UsageData,
    plan: &EnergyPlanDetail,
) -> Result<MonthlyCost, PricingError> {
    let contract = &plan.electricity_contract;
    match contract.pricing_model {
        PricingModel::SingleRate | PricingModel::SingleRateContLoad => {
            let nmi = select_nmi(usage)?;
            let readings = usage.readings(nmi, ReadingType::GeneralUsage);
            tracing::info!(
                plan_id = %plan.plan_id,
                nmi = %nmi,
                readings = readings.len(),
                periods = contract.tariff_period.len(),
                "pricing usage under single rate plan"
            );
            single_rate::calculate(&contract.tariff_period, readings)
        }
        PricingModel::TimeOfUse | PricingModel::TimeOfUseContLoad => calculate_time_of_use(usage, plan),
        other => Err(PricingError::UnsupportedPricingModel(other)),
    }
}

fn calculate_time_of_use(
    _usage: &UsageData,
    _plan: &EnergyPlanDetail,
) -> Result<MonthlyCost, PricingError> {
    Err(PricingError::TimeOfUseUnimplemented)
}

/// Picks the metering point to price. With several, the one with the most
/// general usage readings wins; ties go to the first seen.
pub fn select_nmi(usage: &UsageData) -> Result<&Nmi, PricingError> {
    let mut nmis = usage.nmis();
    let first = nmis.next().ok_or(PricingError::NoUsage)?;
    if usage.len() == 1 {
        return Ok(first);
    }

    let count = |nmi: &Nmi| usage.readings(nmi, ReadingType::GeneralUsage).len();
    let mut selected = first;
    let mut most = count(first);
    for nmi in nmis {
        let readings = count(nmi);
        if readings > most {
            selected = nmi;
            most = readings;
        }
    }

    tracing::info!(
        nmis = usage.len(),
        nmi = %selected,
        readings = most,
        "more than one NMI in usage data, using the one with the most general usage readings"
    );
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_domain::{ElectricityContract, HourlyReading, RateEntry, SingleRate, TariffPeriod};
    use std::collections::BTreeSet;
    use time::{macros::date, Date, Duration};

    fn days(first: Date, count: u32, kwh: f64) -> Vec<HourlyReading> {
        (0..count * 24)
            .map(|hour| {
                let start = first.midnight() + Duration::hours(i64::from(hour));
                HourlyReading {
                    start,
                    end: start + Duration::HOUR,
                    energy_kwh: kwh,
                    quality_methods: BTreeSet::new(),
                    reason_codes: BTreeSet::new(),
                    reason_descriptions: BTreeSet::new(),
                }
            })
            .collect()
    }

    fn plan(model: PricingModel) -> EnergyPlanDetail {
        EnergyPlanDetail {
            plan_id: "TEST@PLAN".to_string(),
            display_name: None,
            brand: None,
            electricity_contract: ElectricityContract {
                pricing_model: model,
                tariff_period: vec![TariffPeriod {
                    display_name: None,
                    start_date: "01-01".to_string(),
                    end_date: "12-31".to_string(),
                    daily_supply_charges: Some("0".to_string()),
                    single_rate: Some(SingleRate {
                        display_name: None,
                        rates: vec![RateEntry {
                            unit_price: "0.25".to_string(),
                            volume: None,
                            measure_unit: None,
                        }],
                    }),
                }],
            },
        }
    }

    #[test]
    fn single_nmi_is_priced_directly() {
        let nmi = Nmi::from("NMI1");
        let mut usage = UsageData::new();
        usage.extend(&nmi, ReadingType::GeneralUsage, days(date!(2024-02-01), 29, 1.0));

        let cost = calculate_monthly(&usage, &plan(PricingModel::SingleRateContLoad)).unwrap();
        let expected = 29.0 * 24.0 * 0.25 * 1.1;
        assert!((cost.average_per_month[1] - expected).abs() < 1e-6);
        assert!((cost.average_monthly - expected).abs() < 1e-6);
    }

    #[test]
    fn nmi_with_most_general_usage_is_selected() {
        let mut usage = UsageData::new();
        let small = Nmi::from("SMALL");
        let big = Nmi::from("BIG");
        usage.extend(&small, ReadingType::GeneralUsage, days(date!(2024-01-01), 2, 1.0));
        usage.extend(&small, ReadingType::PrimaryExport, days(date!(2024-01-01), 60, 1.0));
        usage.extend(&big, ReadingType::GeneralUsage, days(date!(2024-01-01), 31, 1.0));

        assert_eq!(select_nmi(&usage), Ok(&big));

        let cost = calculate_monthly(&usage, &plan(PricingModel::SingleRate)).unwrap();
        assert!(cost.average_per_month[0] > 0.0);
    }

    #[test]
    fn selection_ties_go_to_the_first_nmi() {
        let mut usage = UsageData::new();
        let first = Nmi::from("FIRST");
        let second = Nmi::from("SECOND");
        usage.extend(&first, ReadingType::GeneralUsage, days(date!(2024-01-01), 1, 1.0));
        usage.extend(&second, ReadingType::GeneralUsage, days(date!(2024-03-01), 1, 1.0));
        assert_eq!(select_nmi(&usage), Ok(&first));
    }

    #[test]
    fn empty_usage_cannot_be_priced() {
        let err = calculate_monthly(&UsageData::new(), &plan(PricingModel::SingleRate)).unwrap_err();
        assert_eq!(err, PricingError::NoUsage);
    }

    #[test]
    fn other_pricing_models_are_rejected() {
        let mut usage = UsageData::new();
        usage.extend(&Nmi::from("NMI1"), ReadingType::GeneralUsage, days(date!(2024-01-01), 1, 1.0));

        assert_eq!(
            calculate_monthly(&usage, &plan(PricingModel::TimeOfUse)),
            Err(PricingError::TimeOfUseUnimplemented)
        );
        assert_eq!(
            calculate_monthly(&usage, &plan(PricingModel::TimeOfUseContLoad)),
            Err(PricingError::TimeOfUseUnimplemented)
        );
        assert_eq!(
            calculate_monthly(&usage, &plan(PricingModel::Flexible)),
            Err(PricingError::UnsupportedPricingModel(PricingModel::Flexible))
        );
        assert_eq!(
            calculate_monthly(&usage, &plan(PricingModel::Unknown)),
            Err(PricingError::UnsupportedPricingModel(PricingModel::Unknown))
        );
    }

    #[test]
    fn monthly_cost_serializes_twelve_slots() {
        let cost = MonthlyCost {
            average_monthly: 10.0,
            average_per_month: [10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        };
        let json = serde_json::to_value(&cost).unwrap();
        assert_eq!(json["average_per_month"].as_array().unwrap().len(), 12);
        assert_eq!(json["average_monthly"], 10.0);
    }
}
