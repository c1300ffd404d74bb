use anyhow::{bail, Result};
use serde::Serialize;
use std::env;
use usage_costing::{
    calculate_monthly, config::AppConfig, observability, parse_usage_file, sources::PlanFileSource,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("usage: usage-costing <nem12_path> <plan_json_path>");
    }
    let usage_path = &args[1];
    let plan_path = &args[2];

    // USAGE_COSTING_CONFIG may point at a non-default file.
    let cfg = AppConfig::load()?;

    let usage = parse_usage_file(usage_path, &cfg.source).await?;
    let plan = PlanFileSource::new(plan_path).load().await?;
    let cost = calculate_monthly(&usage, &plan)?;

    tracing::info!(
        plan_id = %plan.plan_id,
        average_monthly = cost.average_monthly,
        "estimated monthly cost"
    );
    print_json(&cost, cfg.output.pretty)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
