use log::info;
use rusqlite::Connection;
use crate::addressing::{location_entry, weather_entry, COLUMN_ID};
use crate::manager_db::errors::DBError;

pub const SCHEMA_VERSION: i32 = 1;

/// Creates or upgrades the schema, tracked with `PRAGMA user_version`
///
/// # Arguments
///
/// * 'conn' - connection to initialize
pub fn initialize(conn: &Connection) -> Result<(), DBError> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version > SCHEMA_VERSION {
        return Err(DBError::Schema(format!(
            "database schema version {} is newer than supported version {}", version, SCHEMA_VERSION
        )));
    }

    if version < SCHEMA_VERSION {
        info!("creating schema version {} (found {})", SCHEMA_VERSION, version);
        create_schema_v1(conn)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }

    Ok(())
}

fn create_schema_v1(conn: &Connection) -> Result<(), DBError> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {loc} (
            {id} INTEGER PRIMARY KEY AUTOINCREMENT,
            {setting} TEXT UNIQUE NOT NULL,
            {city} TEXT NOT NULL,
            {lat} REAL NOT NULL,
            {long} REAL NOT NULL
        );
        CREATE TABLE IF NOT EXISTS {weather} (
            {id} INTEGER PRIMARY KEY AUTOINCREMENT,
            {loc_key} INTEGER NOT NULL REFERENCES {loc} ({id}),
            {date} INTEGER NOT NULL,
            {short_desc} TEXT NOT NULL,
            {weather_id} INTEGER NOT NULL,
            {min} REAL NOT NULL,
            {max} REAL NOT NULL,
            {humidity} REAL NOT NULL,
            {pressure} REAL NOT NULL,
            {wind} REAL NOT NULL,
            {degrees} REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_weather_location_date ON {weather} ({loc_key}, {date});",
        loc = location_entry::TABLE_NAME,
        id = COLUMN_ID,
        setting = location_entry::COLUMN_LOCATION_SETTING,
        city = location_entry::COLUMN_CITY_NAME,
        lat = location_entry::COLUMN_COORD_LAT,
        long = location_entry::COLUMN_COORD_LONG,
        weather = weather_entry::TABLE_NAME,
        loc_key = weather_entry::COLUMN_LOC_KEY,
        date = weather_entry::COLUMN_DATE,
        short_desc = weather_entry::COLUMN_SHORT_DESC,
        weather_id = weather_entry::COLUMN_WEATHER_ID,
        min = weather_entry::COLUMN_MIN_TEMP,
        max = weather_entry::COLUMN_MAX_TEMP,
        humidity = weather_entry::COLUMN_HUMIDITY,
        pressure = weather_entry::COLUMN_PRESSURE,
        wind = weather_entry::COLUMN_WIND_SPEED,
        degrees = weather_entry::COLUMN_DEGREES,
    ))?;

    Ok(())
}
