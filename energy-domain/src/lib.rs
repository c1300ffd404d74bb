pub mod domain;

pub use domain::{
    ElectricityContract, EnergyPlanDetail, HourlyReading, Nmi, PricingModel, RateEntry,
    ReadingType, SingleRate, TariffPeriod, UsageData,
};
