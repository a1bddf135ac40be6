use chrono::DateTime;
use crate::addressing::weather_entry;
use crate::manager_db::models::Row;

/// Formats a temperature without decimals
///
/// # Arguments
///
/// * 'temperature' - temperature in Celsius
/// * 'is_metric' - false converts to Fahrenheit
pub fn format_temperature(temperature: f64, is_metric: bool) -> String {
    let temp = if is_metric {
        temperature
    } else {
        9.0 * temperature / 5.0 + 32.0
    };

    format!("{:.0}", temp.round())
}

/// Formats a stored date as a medium date, e.g. `Dec 20, 2014`
///
/// Stored dates are UTC day starts so they are shown in UTC, a local rendering would shift
/// them to the previous day west of Greenwich.
///
/// # Arguments
///
/// * 'date' - milliseconds since the epoch
pub fn format_date(date: i64) -> Option<String> {
    DateTime::from_timestamp_millis(date).map(|d| d.format("%b %-d, %Y").to_string())
}

/// Formats high and low temperatures as `high/low`
pub fn format_high_lows(high: f64, low: f64, is_metric: bool) -> String {
    format!("{}/{}", format_temperature(high, is_metric), format_temperature(low, is_metric))
}

/// One line summary of a weather row: `date - description - high/low`
///
/// Returns None if the row lacks any of the date, description, max or min columns.
///
/// # Arguments
///
/// * 'row' - a weather row
/// * 'is_metric' - false shows temperatures in Fahrenheit
pub fn forecast_summary(row: &Row, is_metric: bool) -> Option<String> {
    let date = format_date(row.get_i64(weather_entry::COLUMN_DATE)?)?;
    let description = row.get_str(weather_entry::COLUMN_SHORT_DESC)?;
    let high = row.get_f64(weather_entry::COLUMN_MAX_TEMP)?;
    let low = row.get_f64(weather_entry::COLUMN_MIN_TEMP)?;

    Some(format!("{} - {} - {}", date, description, format_high_lows(high, low, is_metric)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager_db::models::{FieldValue, QueryResult};

    #[test]
    fn test_format_temperature() {
        assert_eq!(format_temperature(21.4, true), "21");
        assert_eq!(format_temperature(21.5, true), "22");
        assert_eq!(format_temperature(100.0, false), "212");
        assert_eq!(format_temperature(-40.0, false), "-40");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(1419033600000).as_deref(), Some("Dec 20, 2014"));
        assert_eq!(format_date(0).as_deref(), Some("Jan 1, 1970"));
        assert_eq!(format_date(i64::MAX), None);
    }

    #[test]
    fn test_format_high_lows() {
        assert_eq!(format_high_lows(25.0, 10.0, true), "25/10");
        assert_eq!(format_high_lows(25.0, 10.0, false), "77/50");
    }

    #[test]
    fn test_forecast_summary() {
        let result = QueryResult {
            columns: vec!["date".into(), "short_desc".into(), "max".into(), "min".into()],
            rows: vec![
                vec![
                    FieldValue::from(1419033600000_i64),
                    FieldValue::from("Clear"),
                    FieldValue::from(12.0),
                    FieldValue::from(3.0),
                ],
                vec![FieldValue::from(1419033600000_i64), FieldValue::Null, FieldValue::from(1.0), FieldValue::from(0.0)],
            ],
        };
        let mut rows = result.iter();

        assert_eq!(forecast_summary(&rows.next().unwrap(), true).as_deref(), Some("Dec 20, 2014 - Clear - 12/3"));
        assert_eq!(forecast_summary(&rows.next().unwrap(), true), None);
    }
}
