// src/bin/debug_fetch.rs
//
// Fetches the raw sales CSV, runs the monthly aggregation, and dumps the
// resulting series so loader changes can be eyeballed against the source.

use demand_forecast_bot::services::loader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let records = loader::fetch_sales_records(loader::SALES_DATA_URL).await?;
    println!("fetched {} raw order rows", records.len());

    let series = loader::load_monthly_series(&records)?;
    println!("monthly series ({} observations):", series.len());
    for (date, value) in series.dates().iter().zip(series.values()) {
        println!("{}  {:>10.1}", date, value);
    }

    Ok(())
}
