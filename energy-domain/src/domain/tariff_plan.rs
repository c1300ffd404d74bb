use serde::{Deserialize, Serialize};

/// Plan detail document as published by the energy product registry.
///
/// Only the parts needed for pricing are modelled; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyPlanDetail {
    pub plan_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    pub electricity_contract: ElectricityContract,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectricityContract {
    pub pricing_model: PricingModel,
    #[serde(default)]
    pub tariff_period: Vec<TariffPeriod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingModel {
    SingleRate,
    SingleRateContLoad,
    TimeOfUse,
    TimeOfUseContLoad,
    Flexible,
    FlexibleContLoad,
    #[serde(other)]
    Unknown,
}

/// A year-agnostic window with its own supply charge and rates.
///
/// `start_date`/`end_date` are `MM-DD` strings and may wrap over new year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffPeriod {
    #[serde(default)]
    pub display_name: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub daily_supply_charges: Option<String>,
    #[serde(default)]
    pub single_rate: Option<SingleRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleRate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub rates: Vec<RateEntry>,
}

/// A consumption bracket. `volume` is the upper bound in kWh; the entry
/// without one prices all remaining energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateEntry {
    pub unit_price: String,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub measure_unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_detail_deserializes_from_registry_json() {
        let json = r#"{
            "planId": "TEST123@VEC",
            "displayName": "Flat saver",
            "lastUpdated": "2024-01-01T00:00:00Z",
            "electricityContract": {
                "pricingModel": "SINGLE_RATE_CONT_LOAD",
                "tariffPeriod": [{
                    "startDate": "01-01",
                    "endDate": "12-31",
                    "dailySupplyCharges": "0.95",
                    "singleRate": {
                        "rates": [
                            { "unitPrice": "0.20", "volume": 10 },
                            { "unitPrice": "0.30", "measureUnit": "KWH" }
                        ]
                    }
                }]
            }
        }"#;

        let plan: EnergyPlanDetail = serde_json::from_str(json).unwrap();
        assert_eq!(plan.plan_id, "TEST123@VEC");
        assert_eq!(plan.electricity_contract.pricing_model, PricingModel::SingleRateContLoad);

        let period = &plan.electricity_contract.tariff_period[0];
        assert_eq!(period.daily_supply_charges.as_deref(), Some("0.95"));
        let rates = &period.single_rate.as_ref().unwrap().rates;
        assert_eq!(rates[0].volume, Some(10.0));
        assert!(rates[1].volume.is_none());
    }

    #[test]
    fn unknown_pricing_model_is_tolerated() {
        let json = r#"{ "pricingModel": "DEMAND_BLOCKS", "tariffPeriod": [] }"#;
        let contract: ElectricityContract = serde_json::from_str(json).unwrap();
        assert_eq!(contract.pricing_model, PricingModel::Unknown);
    }
}
