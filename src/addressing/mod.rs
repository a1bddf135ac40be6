pub mod errors;

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, DurationRound, TimeDelta};
use url::Url;
use crate::addressing::errors::AddressError;

pub const CONTENT_SCHEME: &str = "content";
pub const CONTENT_AUTHORITY: &str = "com.kenano.android.mysunshine.data";

pub const PATH_WEATHER: &str = "weather";
pub const PATH_LOCATION: &str = "location";

/// Query parameter carrying the "on or after" date filter
pub const DATE_PARAM: &str = "date";

pub const WEATHER_CONTENT_TYPE: &str =
    "vnd.android.cursor.dir/com.kenano.android.mysunshine.data/weather";
pub const WEATHER_CONTENT_ITEM_TYPE: &str =
    "vnd.android.cursor.item/com.kenano.android.mysunshine.data/weather";
pub const LOCATION_CONTENT_TYPE: &str =
    "vnd.android.cursor.dir/com.kenano.android.mysunshine.data/location";
pub const LOCATION_CONTENT_ITEM_TYPE: &str =
    "vnd.android.cursor.item/com.kenano.android.mysunshine.data/location";

/// Primary key column shared by both tables
pub const COLUMN_ID: &str = "_id";

/// Table and column names of the location collection
pub mod location_entry {
    pub const TABLE_NAME: &str = "location";
    pub const COLUMN_LOCATION_SETTING: &str = "location_setting";
    pub const COLUMN_CITY_NAME: &str = "city_name";
    pub const COLUMN_COORD_LAT: &str = "coord_lat";
    pub const COLUMN_COORD_LONG: &str = "coord_long";
}

/// Table and column names of the weather collection
pub mod weather_entry {
    pub const TABLE_NAME: &str = "weather";
    pub const COLUMN_LOC_KEY: &str = "location_id";
    /// Milliseconds since the epoch, always stored normalized to the start of the UTC day
    pub const COLUMN_DATE: &str = "date";
    pub const COLUMN_WEATHER_ID: &str = "weather_id";
    pub const COLUMN_SHORT_DESC: &str = "short_desc";
    pub const COLUMN_MIN_TEMP: &str = "min";
    pub const COLUMN_MAX_TEMP: &str = "max";
    pub const COLUMN_HUMIDITY: &str = "humidity";
    pub const COLUMN_PRESSURE: &str = "pressure";
    pub const COLUMN_WIND_SPEED: &str = "wind";
    pub const COLUMN_DEGREES: &str = "degrees";
}

const DAY_MILLIS: i64 = 86_400_000;

/// Julian day number of 1970-01-01
const EPOCH_JULIAN_DAY: i64 = 2_440_588;

/// A resource locator of the form `scheme://authority/segment/...[?key=value&...]`.
///
/// Segments and query values are held decoded; escaping only happens when the address
/// is rendered to or parsed from its string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    scheme: String,
    authority: String,
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Address {
    /// Returns the root address of a collection under the content authority
    ///
    /// # Arguments
    ///
    /// * 'collection' - collection path, `weather` or `location`
    pub fn collection(collection: &str) -> Self {
        Address {
            scheme: CONTENT_SCHEME.to_string(),
            authority: CONTENT_AUTHORITY.to_string(),
            segments: vec![collection.to_string()],
            query: Vec::new(),
        }
    }

    /// Parses an address from its string form, decoding escaped path segments and query values
    ///
    /// # Arguments
    ///
    /// * 'address' - address string, e.g. `content://<authority>/weather/94043?date=0`
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let url = Url::parse(address)?;
        if url.cannot_be_a_base() {
            return Err(AddressError::InvalidAddress(format!("not a hierarchical address: {}", address)));
        }

        let mut segments = Vec::new();
        for segment in raw_path(address)?.split('/').skip(1) {
            segments.push(urlencoding::decode(segment)?.into_owned());
        }

        let query = url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Address {
            scheme: url.scheme().to_string(),
            authority: url.authority().to_string(),
            segments,
            query,
        })
    }

    /// Appends a path segment, the value is kept as one opaque segment whatever it contains
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn with_query_parameter(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path_segments(&self) -> &[String] {
        &self.segments
    }

    pub fn last_path_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the first value of the given query parameter, if any
    pub fn query_parameter(&self, key: &str) -> Option<&str> {
        self.query.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)?;
        for segment in &self.segments {
            write!(f, "/{}", urlencoding::encode(segment))?;
        }
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, urlencoding::encode(key), urlencoding::encode(value))?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

/// Returns the path of an address string exactly as written.
///
/// `Url` removes `.` and `..` segments from the path, which would turn an escaped location
/// such as `.` into a different address, so segments are taken from the raw string instead.
/// Every segment is kept, empty ones included, making this the exact inverse of `Display`.
fn raw_path(address: &str) -> Result<&str, AddressError> {
    let address = address.trim();
    let after_scheme = address.find("://")
        .map(|i| &address[i + 3..])
        .ok_or_else(|| AddressError::InvalidAddress(format!("no authority in {}", address)))?;

    let end = after_scheme.find(['?', '#']).unwrap_or(after_scheme.len());
    let without_query = &after_scheme[..end];

    Ok(without_query.find('/').map_or("", |start| &without_query[start..]))
}

/// Root address of the weather collection
pub fn weather_address() -> Address {
    Address::collection(PATH_WEATHER)
}

/// Root address of the location collection
pub fn location_address() -> Address {
    Address::collection(PATH_LOCATION)
}

/// Address of a single location row
///
/// # Arguments
///
/// * 'id' - row id of the location
pub fn build_location_address(id: i64) -> Address {
    location_address().with_segment(id.to_string())
}

/// Address of a single weather row, as returned after an insert
///
/// # Arguments
///
/// * 'id' - row id of the weather record
pub fn build_weather_item_address(id: i64) -> Address {
    weather_address().with_segment(id.to_string())
}

/// Address for all weather of a location, e.g. `content://<authority>/weather/94043`
///
/// # Arguments
///
/// * 'location_setting' - the location key, escaped as a single segment when rendered
pub fn build_weather_address(location_setting: &str) -> Address {
    weather_address().with_segment(location_setting)
}

/// Address for the weather of a location on one day
///
/// # Arguments
///
/// * 'location_setting' - the location key
/// * 'date' - any timestamp (millis) within the day, normalized before embedding
pub fn build_weather_address_with_exact_date(location_setting: &str, date: i64) -> Address {
    build_weather_address(location_setting).with_segment(normalize_date(date).to_string())
}

/// Address for the weather of a location on or after a day
///
/// # Arguments
///
/// * 'location_setting' - the location key
/// * 'start_date' - any timestamp (millis) within the first day, normalized before embedding
pub fn build_weather_address_with_start_date(location_setting: &str, start_date: i64) -> Address {
    build_weather_address(location_setting)
        .with_query_parameter(DATE_PARAM, normalize_date(start_date).to_string())
}

/// Returns the location setting, i.e. the second path segment
pub fn parse_location_setting(address: &Address) -> Result<String, AddressError> {
    address.path_segments()
        .get(1)
        .cloned()
        .ok_or_else(|| AddressError::UnknownAddress(format!("no location segment in {}", address)))
}

/// Returns the date held in the third path segment
pub fn parse_exact_date(address: &Address) -> Result<i64, AddressError> {
    let segment = address.path_segments()
        .get(2)
        .ok_or_else(|| AddressError::MalformedDate(format!("no date segment in {}", address)))?;

    parse_date_value(segment, address)
}

/// Returns the `date` query parameter, or 0 when absent or empty (no lower bound)
pub fn parse_start_date(address: &Address) -> Result<i64, AddressError> {
    match address.query_parameter(DATE_PARAM) {
        Some(value) if !value.is_empty() => parse_date_value(value, address),
        _ => Ok(0),
    }
}

fn parse_date_value(value: &str, address: &Address) -> Result<i64, AddressError> {
    value.parse::<i64>()
        .map_err(|e| AddressError::MalformedDate(format!("'{}' in {}: {}", value, address, e)))
}

/// Returns the Julian day number of the UTC day containing the timestamp
///
/// # Arguments
///
/// * 'timestamp' - milliseconds since the epoch
pub fn julian_day(timestamp: i64) -> i64 {
    timestamp.div_euclid(DAY_MILLIS) + EPOCH_JULIAN_DAY
}

/// Returns the timestamp (millis) of the start of the given Julian day at UTC
pub fn from_julian_day(julian_day: i64) -> i64 {
    (julian_day - EPOCH_JULIAN_DAY) * DAY_MILLIS
}

/// Normalizes a timestamp to the start of its UTC calendar day.
///
/// All dates going into the weather table, and all dates used as filter values, pass
/// through here so that an exact-day lookup matches rows written at any time of that day.
///
/// # Arguments
///
/// * 'timestamp' - milliseconds since the epoch
pub fn normalize_date(timestamp: i64) -> i64 {
    match DateTime::from_timestamp_millis(timestamp)
        .and_then(|d| d.duration_trunc(TimeDelta::days(1)).ok()) {
        Some(day) => day.timestamp_millis(),
        // Outside chrono's range, fall back on plain day arithmetic
        None => from_julian_day(julian_day(timestamp)),
    }
}
