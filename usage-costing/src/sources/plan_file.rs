use std::path::PathBuf;

use energy_domain::EnergyPlanDetail;
use serde::Deserialize;

use crate::pipeline::PipelineError;

/// Plan documents arrive either bare or wrapped in a `data` envelope, as
/// served by retailer product APIs.
#[derive(Deserialize)]
#[serde(untagged)]
enum PlanDocument {
    Envelope { data: EnergyPlanDetail },
    Bare(EnergyPlanDetail),
}

pub fn parse_plan_document(contents: &str) -> Result<EnergyPlanDetail, PipelineError> {
    let document: PlanDocument = serde_json::from_str(contents)
        .map_err(|e| PipelineError::Source(format!("invalid energy plan document: {e}")))?;
    Ok(match document {
        PlanDocument::Envelope { data } => data,
        PlanDocument::Bare(plan) => plan,
    })
}

/// Loads a single energy plan from a JSON file.
pub struct PlanFileSource {
    path: PathBuf,
}

impl PlanFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<EnergyPlanDetail, PipelineError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PipelineError::Source(format!(
                "failed to read energy plan {}: {e}",
                self.path.display()
            ))
        })?;
        let plan = parse_plan_document(&contents)?;
        tracing::info!(
            plan_id = %plan.plan_id,
            periods = plan.electricity_contract.tariff_period.len(),
            pricing_model = ?plan.electricity_contract.pricing_model,
            "loaded energy plan"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_domain::PricingModel;

    const PLAN: &str = r#"{
        "planId": "ACME-SR-01",
        "electricityContract": {
            "pricingModel": "SINGLE_RATE",
            "tariffPeriod": [{
                "startDate": "01-01",
                "endDate": "12-31",
                "dailySupplyCharges": "1.0",
                "singleRate": { "rates": [{ "unitPrice": "0.30" }] }
            }]
        }
    }"#;

    #[test]
    fn bare_plan_is_accepted() {
        let plan = parse_plan_document(PLAN).unwrap();
        assert_eq!(plan.plan_id, "ACME-SR-01");
        assert_eq!(plan.electricity_contract.pricing_model, PricingModel::SingleRate);
    }

    #[test]
    fn enveloped_plan_is_unwrapped() {
        let wrapped = format!(r#"{{"data": {PLAN}, "meta": {{}}}}"#);
        let plan = parse_plan_document(&wrapped).unwrap();
        assert_eq!(plan.electricity_contract.tariff_period.len(), 1);
    }

    #[test]
    fn malformed_plan_is_a_source_error() {
        let err = parse_plan_document(r#"{"planId": 7}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Source(_)));
    }

    #[tokio::test]
    async fn missing_plan_file_is_a_source_error() {
        let err = PlanFileSource::new("/definitely/not/plan.json")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Source(ref m) if m.contains("plan.json")));
    }
}
