use anyhow::Result;
use chrono::NaiveDate;
use sosapi::{AreaType, Client, Query};
use std::path::Path;

fn main() -> Result<()> {
    // Example program that calls the library API.
    // Configure authentication via env vars or a `.sosapirc` file.
    let client = Client::from_env()?;

    // Eurasian eagle-owl sightings in Uppland, May 2024.
    let uppland = client.get_area_id(AreaType::Province, "Uppland")?;
    let mut query = Query::builder()
        .provinces(vec![uppland])
        .taxons(vec![100020])
        .start_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        .end_date(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap())
        .build()?;

    let count = client.get_count(&query)?;
    println!("{count} matching observations");

    for observation in client.get_observations(&mut query)? {
        println!("{}", serde_json::to_string(&observation)?);
    }

    client.download_csv(&mut query, Path::new("observations.csv.gz"), true, None)?;
    Ok(())
}
