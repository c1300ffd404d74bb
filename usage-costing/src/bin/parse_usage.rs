use anyhow::{bail, Result};
use std::env;
use usage_costing::{config::AppConfig, observability, parse_usage_file};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: parse_usage <nem12_path>");
    }
    let file_path = &args[1];

    let cfg = AppConfig::load()?;
    let usage = parse_usage_file(file_path, &cfg.source).await?;

    let json = if cfg.output.pretty {
        serde_json::to_string_pretty(&usage)?
    } else {
        serde_json::to_string(&usage)?
    };
    println!("{json}");
    Ok(())
}
