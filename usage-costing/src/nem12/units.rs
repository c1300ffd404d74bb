use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported unit of measure '{0}'")]
pub struct UnitConversionError(pub String);

/// Energy units a NEM12 stream can be reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyUnit {
    WattHour,
    KilowattHour,
    MegawattHour,
}

impl EnergyUnit {
    pub fn kwh_multiplier(self) -> f64 {
        match self {
            EnergyUnit::WattHour => 0.001,
            EnergyUnit::KilowattHour => 1.0,
            EnergyUnit::MegawattHour => 1000.0,
        }
    }
}

impl FromStr for EnergyUnit {
    type Err = UnitConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wh" => Ok(EnergyUnit::WattHour),
            "kwh" => Ok(EnergyUnit::KilowattHour),
            "mwh" => Ok(EnergyUnit::MegawattHour),
            _ => Err(UnitConversionError(s.to_string())),
        }
    }
}

/// Multiplier taking a value in the NEM12 unit of measure `unit` to kWh.
pub fn kwh_multiplier(unit: &str) -> Result<f64, UnitConversionError> {
    unit.parse::<EnergyUnit>().map(EnergyUnit::kwh_multiplier)
}
