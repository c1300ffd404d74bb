pub mod meter_usage;
pub mod tariff_plan;

pub use meter_usage::{HourlyReading, Nmi, ReadingType, UsageData};
pub use tariff_plan::{
    ElectricityContract, EnergyPlanDetail, PricingModel, RateEntry, SingleRate, TariffPeriod,
};
