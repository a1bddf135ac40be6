use log::debug;
use crate::addressing::errors::AddressError;
use crate::addressing::{
    location_entry, normalize_date, parse_exact_date, parse_start_date, weather_entry, Address,
    CONTENT_AUTHORITY, CONTENT_SCHEME, LOCATION_CONTENT_TYPE, PATH_LOCATION, PATH_WEATHER,
    WEATHER_CONTENT_ITEM_TYPE, WEATHER_CONTENT_TYPE,
};
use crate::manager_db::errors::DBError;
use crate::manager_db::models::{FieldValue, QueryResult};
use crate::manager_db::{RelationalStore, Select};

/// weather INNER JOIN location ON weather.location_id = location._id
pub const WEATHER_BY_LOCATION_SETTING_TABLES: &str =
    "weather INNER JOIN location ON weather.location_id = location._id";

/// Value bound to a `?` placeholder of a selection template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateParam {
    LocationSetting,
    Date,
}

/// A fixed selection clause together with the order of its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTemplate {
    pub clause: &'static str,
    pub params: &'static [TemplateParam],
}

impl SelectionTemplate {
    fn bind(&self, location_setting: &str, date: i64) -> Vec<FieldValue> {
        self.params.iter()
            .map(|p| match p {
                TemplateParam::LocationSetting => FieldValue::from(location_setting),
                TemplateParam::Date => FieldValue::from(date),
            })
            .collect()
    }
}

/// location.location_setting = ?
pub const LOCATION_SETTING_SELECTION: SelectionTemplate = SelectionTemplate {
    clause: "location.location_setting = ?",
    params: &[TemplateParam::LocationSetting],
};

/// location.location_setting = ? AND weather.date >= ?
pub const LOCATION_SETTING_WITH_START_DATE_SELECTION: SelectionTemplate = SelectionTemplate {
    clause: "location.location_setting = ? AND weather.date >= ?",
    params: &[TemplateParam::LocationSetting, TemplateParam::Date],
};

/// location.location_setting = ? AND weather.date = ?
pub const LOCATION_SETTING_AND_DAY_SELECTION: SelectionTemplate = SelectionTemplate {
    clause: "location.location_setting = ? AND weather.date = ?",
    params: &[TemplateParam::LocationSetting, TemplateParam::Date],
};

/// The four kinds of request an address can denote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// `weather/<location>/<date>`
    WeatherByLocationAndExactDate { location_setting: String, date: i64 },
    /// `weather/<location>[?date=<date>]`, a start date of 0 means no lower bound
    WeatherByLocationAndStartDate { location_setting: String, start_date: i64 },
    /// `weather`
    WeatherUnfiltered,
    /// `location`
    LocationUnfiltered,
}

impl RequestKind {
    /// Classifies an address, most specific shape first.
    ///
    /// Dates found in the address are normalized, so a hand built address with an intra-day
    /// timestamp still hits the stored day. Any other shape is an error, the router never guesses.
    ///
    /// # Arguments
    ///
    /// * 'address' - address to classify
    pub fn classify(address: &Address) -> Result<Self, AddressError> {
        if address.scheme() != CONTENT_SCHEME || address.authority() != CONTENT_AUTHORITY {
            return Err(AddressError::UnknownAddress(address.to_string()));
        }

        let segments = address.path_segments();
        let kind = match (segments.first().map(String::as_str), segments.len()) {
            (Some(PATH_WEATHER), 3) => RequestKind::WeatherByLocationAndExactDate {
                location_setting: segments[1].clone(),
                date: normalize_date(parse_exact_date(address)?),
            },
            (Some(PATH_WEATHER), 2) => {
                let start_date = match parse_start_date(address)? {
                    0 => 0,
                    date => normalize_date(date),
                };
                RequestKind::WeatherByLocationAndStartDate {
                    location_setting: segments[1].clone(),
                    start_date,
                }
            }
            (Some(PATH_WEATHER), 1) => RequestKind::WeatherUnfiltered,
            (Some(PATH_LOCATION), 1) => RequestKind::LocationUnfiltered,
            _ => return Err(AddressError::UnknownAddress(address.to_string())),
        };

        Ok(kind)
    }

    /// Returns the content type for the kind, collection or single item
    pub fn content_type(&self) -> &'static str {
        match self {
            RequestKind::WeatherByLocationAndExactDate { .. } => WEATHER_CONTENT_ITEM_TYPE,
            RequestKind::WeatherByLocationAndStartDate { .. } => WEATHER_CONTENT_TYPE,
            RequestKind::WeatherUnfiltered => WEATHER_CONTENT_TYPE,
            RequestKind::LocationUnfiltered => LOCATION_CONTENT_TYPE,
        }
    }

    /// Builds the query for this kind.
    ///
    /// Caller selection is only used by the unfiltered kinds; the location kinds bring their
    /// own selection template and ignore it.
    ///
    /// # Arguments
    ///
    /// * 'selection' - caller supplied where clause
    /// * 'selection_args' - values for the placeholders in `selection`
    pub fn build_query<'a>(&'a self, selection: Option<&'a str>, selection_args: &[FieldValue]) -> RoutedQuery<'a> {
        match self {
            RequestKind::WeatherByLocationAndExactDate { location_setting, date } => {
                RoutedQuery::from_template(&LOCATION_SETTING_AND_DAY_SELECTION, location_setting, *date)
            }
            RequestKind::WeatherByLocationAndStartDate { location_setting, start_date } => {
                let template = if *start_date == 0 {
                    &LOCATION_SETTING_SELECTION
                } else {
                    &LOCATION_SETTING_WITH_START_DATE_SELECTION
                };
                RoutedQuery::from_template(template, location_setting, *start_date)
            }
            RequestKind::WeatherUnfiltered => RoutedQuery {
                target: QueryTarget::Table(weather_entry::TABLE_NAME),
                selection,
                selection_args: selection_args.to_vec(),
            },
            RequestKind::LocationUnfiltered => RoutedQuery {
                target: QueryTarget::Table(location_entry::TABLE_NAME),
                selection,
                selection_args: selection_args.to_vec(),
            },
        }
    }
}

/// What a routed query selects from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTarget {
    Table(&'static str),
    Join(&'static str),
}

/// A query ready to run against the relational store
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedQuery<'a> {
    pub target: QueryTarget,
    pub selection: Option<&'a str>,
    pub selection_args: Vec<FieldValue>,
}

impl<'a> RoutedQuery<'a> {
    fn from_template(template: &SelectionTemplate, location_setting: &str, date: i64) -> Self {
        RoutedQuery {
            target: QueryTarget::Join(WEATHER_BY_LOCATION_SETTING_TABLES),
            selection: Some(template.clause),
            selection_args: template.bind(location_setting, date),
        }
    }

    /// Runs the query, store errors are handed back unchanged
    ///
    /// # Arguments
    ///
    /// * 'store' - relational store to run against
    /// * 'projection' - columns to return, all when None
    /// * 'sort_order' - order by clause
    pub fn execute<S: RelationalStore + ?Sized>(
        &self,
        store: &S,
        projection: Option<&[&str]>,
        sort_order: Option<&str>,
    ) -> Result<QueryResult, DBError> {
        let select = Select {
            projection,
            selection: self.selection,
            selection_args: &self.selection_args,
            order_by: sort_order,
            ..Default::default()
        };

        debug!("running {:?} where {:?}", self.target, self.selection);
        match self.target {
            QueryTarget::Table(table) => store.query(table, &select),
            QueryTarget::Join(tables) => store.query_join(tables, &select),
        }
    }
}
