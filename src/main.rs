use std::env;
use chrono::Utc;
use log::{info, warn};
use weatherstore::addressing::{build_weather_address_with_start_date, weather_entry, Address};
use weatherstore::errors::UnrecoverableError;
use weatherstore::formatting::forecast_summary;
use weatherstore::gateway::{LogSink, StorageGateway};
use weatherstore::initialization::{config, Preferences};
use weatherstore::logging::setup_logger;
use weatherstore::manager_db::models::Row;
use weatherstore::manager_db::DB;

type Gateway = StorageGateway<DB, LogSink>;

fn main() -> Result<(), UnrecoverableError> {
    let config = config()?;
    setup_logger(&config.logging)?;

    let db = DB::new(&config.db.db_path)?;
    let gateway = StorageGateway::new(db, LogSink);

    match env::args().nth(1) {
        Some(address) => dump_address(&gateway, &address),
        None => print_forecast(&gateway, &config.preferences),
    }
}

/// Prints every row the address resolves to as json
///
/// # Arguments
///
/// * 'gateway' - gateway to query
/// * 'address' - address in string form
fn dump_address(gateway: &Gateway, address: &str) -> Result<(), UnrecoverableError> {
    let address = Address::parse(address)?;
    let result = gateway.query(&address, None, None, &[], None)?;
    info!("{} rows for {}", result.len(), address);

    let rows: Vec<Row> = result.iter().collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);

    Ok(())
}

/// Prints the forecast for the preferred location from today on, one line per day
///
/// # Arguments
///
/// * 'gateway' - gateway to query
/// * 'preferences' - preferred location and units
fn print_forecast(gateway: &Gateway, preferences: &Preferences) -> Result<(), UnrecoverableError> {
    let address = build_weather_address_with_start_date(&preferences.location, Utc::now().timestamp_millis());
    let sort_order = format!("{} ASC", weather_entry::COLUMN_DATE);

    let result = gateway.query(&address, None, None, &[], Some(sort_order.as_str()))?;
    info!("{} forecast rows for {}", result.len(), preferences.location);

    for row in result.iter() {
        match forecast_summary(&row, preferences.units.is_metric()) {
            Some(line) => println!("{}", line),
            None => warn!("skipping incomplete weather row: {:?}", row),
        }
    }

    Ok(())
}
