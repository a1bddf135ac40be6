pub mod errors;

use log::{debug, info};
use crate::addressing::{
    build_location_address, build_weather_item_address, location_entry, normalize_date,
    weather_entry, Address,
};
use crate::gateway::errors::GatewayError;
use crate::manager_db::models::{FieldValue, Fields, QueryResult, Row};
use crate::manager_db::RelationalStore;
use crate::router::RequestKind;

/// Receives "data at this address changed" signals after successful mutations.
///
/// Delivery is fire and forget, the mutating call neither waits on nor retries it.
pub trait NotificationSink {
    fn notify(&self, address: &Address);
}

impl<T: NotificationSink + ?Sized> NotificationSink for &T {
    fn notify(&self, address: &Address) {
        (**self).notify(address)
    }
}

/// Sink that only logs the change
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, address: &Address) {
        info!("data changed at {}", address);
    }
}

/// Rows returned by a query, bound to the address they were resolved for
#[derive(Debug, Clone)]
pub struct ResultSet {
    address: Address,
    result: QueryResult,
}

impl ResultSet {
    /// The address whose change notifications make this result stale
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn columns(&self) -> &[String] {
        &self.result.columns
    }

    pub fn len(&self) -> usize {
        self.result.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.result.iter()
    }

    pub fn into_result(self) -> QueryResult {
        self.result
    }
}

/// Collection a mutation is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Weather,
    Location,
}

impl Collection {
    fn table(&self) -> &'static str {
        match self {
            Collection::Weather => weather_entry::TABLE_NAME,
            Collection::Location => location_entry::TABLE_NAME,
        }
    }
}

/// Entry point for reading and writing weather and location records by address
pub struct StorageGateway<S, N> {
    store: S,
    sink: N,
}

impl<S: RelationalStore, N: NotificationSink> StorageGateway<S, N> {

    /// Creates a new gateway
    ///
    /// # Arguments
    ///
    /// * 'store' - relational store holding the location and weather tables
    /// * 'sink' - receiver of change notifications
    pub fn new(store: S, sink: N) -> Self {
        StorageGateway { store, sink }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Queries whatever the address denotes
    ///
    /// # Arguments
    ///
    /// * 'address' - what to read
    /// * 'projection' - columns to return, all when None
    /// * 'selection' - where clause, only used for the bare `weather` and `location` addresses
    /// * 'selection_args' - values for the placeholders in `selection`
    /// * 'sort_order' - order by clause, e.g. `date ASC`
    pub fn query(
        &self,
        address: &Address,
        projection: Option<&[&str]>,
        selection: Option<&str>,
        selection_args: &[FieldValue],
        sort_order: Option<&str>,
    ) -> Result<ResultSet, GatewayError> {
        let kind = RequestKind::classify(address)?;
        debug!("query {} as {:?}", address, kind);

        let result = kind.build_query(selection, selection_args)
            .execute(&self.store, projection, sort_order)?;

        Ok(ResultSet { address: address.clone(), result })
    }

    /// Returns the content type of the address, collection or single item
    pub fn resource_type(&self, address: &Address) -> Result<&'static str, GatewayError> {
        Ok(RequestKind::classify(address)?.content_type())
    }

    /// Inserts a row and returns the address of the new row
    ///
    /// A weather date is normalized to the start of its day before it is written.
    ///
    /// # Arguments
    ///
    /// * 'address' - collection root, `weather` or `location`
    /// * 'fields' - column values of the new row
    pub fn insert(&self, address: &Address, mut fields: Fields) -> Result<Address, GatewayError> {
        let collection = mutation_target(address)?;
        if collection == Collection::Weather {
            normalize_date_field(&mut fields)?;
        }

        let inserted = match self.store.insert(collection.table(), &fields)? {
            Some(id) if id > 0 => match collection {
                Collection::Weather => build_weather_item_address(id),
                Collection::Location => build_location_address(id),
            },
            _ => return Err(GatewayError::Write(format!("failed to insert row into {}", address))),
        };

        info!("inserted {} into {}", inserted, collection.table());
        self.notify(address);

        Ok(inserted)
    }

    /// Updates rows and returns how many were changed, observers are only told when that is not zero
    ///
    /// # Arguments
    ///
    /// * 'address' - collection root, `weather` or `location`
    /// * 'fields' - new column values
    /// * 'selection' - where clause, all rows when None
    /// * 'selection_args' - values for the placeholders in `selection`
    pub fn update(
        &self,
        address: &Address,
        mut fields: Fields,
        selection: Option<&str>,
        selection_args: &[FieldValue],
    ) -> Result<usize, GatewayError> {
        let collection = mutation_target(address)?;
        if collection == Collection::Weather {
            normalize_date_field(&mut fields)?;
        }

        let rows_updated = self.store.update(collection.table(), &fields, selection, selection_args)?;
        info!("updated {} rows in {}", rows_updated, collection.table());

        if rows_updated > 0 {
            self.notify(address);
        }

        Ok(rows_updated)
    }

    /// Deletes rows and returns how many were removed.
    ///
    /// An absent selection matches every row, so deleting all reports the real count. Observers
    /// are only told when something was removed, an already empty table stays silent.
    ///
    /// # Arguments
    ///
    /// * 'address' - collection root, `weather` or `location`
    /// * 'selection' - where clause, all rows when None
    /// * 'selection_args' - values for the placeholders in `selection`
    pub fn delete(
        &self,
        address: &Address,
        selection: Option<&str>,
        selection_args: &[FieldValue],
    ) -> Result<usize, GatewayError> {
        let collection = mutation_target(address)?;

        let rows_deleted = self.store.delete(collection.table(), Some(selection.unwrap_or("1")), selection_args)?;
        info!("deleted {} rows from {}", rows_deleted, collection.table());

        if rows_deleted > 0 {
            self.notify(address);
        }

        Ok(rows_deleted)
    }

    fn notify(&self, address: &Address) {
        debug!("notify {}", address);
        self.sink.notify(address);
    }
}

/// Resolves the table a mutation goes to, only the collection roots accept writes
fn mutation_target(address: &Address) -> Result<Collection, GatewayError> {
    match RequestKind::classify(address)? {
        RequestKind::WeatherUnfiltered => Ok(Collection::Weather),
        RequestKind::LocationUnfiltered => Ok(Collection::Location),
        _ => Err(GatewayError::UnsupportedOperation(format!("cannot write to {}", address))),
    }
}

fn normalize_date_field(fields: &mut Fields) -> Result<(), GatewayError> {
    let date = match fields.get(weather_entry::COLUMN_DATE) {
        None => return Ok(()),
        Some(FieldValue::Real(r)) if r.is_finite() => *r as i64,
        Some(value) => value.as_i64().ok_or_else(|| {
            GatewayError::InvalidField(format!("{} is not a timestamp: {:?}", weather_entry::COLUMN_DATE, value))
        })?,
    };

    fields.put(weather_entry::COLUMN_DATE, normalize_date(date));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use super::*;
    use crate::addressing::errors::AddressError;
    use crate::addressing::{
        build_weather_address, build_weather_address_with_exact_date,
        build_weather_address_with_start_date, location_address, weather_address,
        LOCATION_CONTENT_TYPE, WEATHER_CONTENT_ITEM_TYPE, WEATHER_CONTENT_TYPE,
    };
    use crate::manager_db::errors::DBError;
    use crate::manager_db::{Select, DB};

    const TEST_LOCATION: &str = "99705";
    // December 20th, 2014
    const TEST_DATE: i64 = 1419033600000;
    const DAY: i64 = 86_400_000;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Address>>);

    impl NotificationSink for Recorder {
        fn notify(&self, address: &Address) {
            self.0.borrow_mut().push(address.clone());
        }
    }

    impl Recorder {
        fn count(&self) -> usize {
            self.0.borrow().len()
        }
    }

    fn location_values() -> Fields {
        Fields::new()
            .with("location_setting", TEST_LOCATION)
            .with("city_name", "North Pole")
            .with("coord_lat", 64.7488)
            .with("coord_long", -147.353)
    }

    fn weather_values(location_id: i64, date: i64) -> Fields {
        Fields::new()
            .with("location_id", location_id)
            .with("date", date)
            .with("degrees", 1.1)
            .with("humidity", 1.2)
            .with("pressure", 1.3)
            .with("max", 75.0)
            .with("min", 65.0)
            .with("short_desc", "Asteroids")
            .with("wind", 5.5)
            .with("weather_id", 321)
    }

    /// Inserts the test location and returns its id
    fn insert_location<N: NotificationSink>(gateway: &StorageGateway<DB, N>) -> i64 {
        let address = gateway.insert(&location_address(), location_values()).unwrap();
        address.last_path_segment().unwrap().parse().unwrap()
    }

    #[test]
    fn test_insert_returns_row_address_and_notifies() {
        let recorder = Recorder::default();
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), &recorder);

        let location = gateway.insert(&location_address(), location_values()).unwrap();
        assert_eq!(location, build_location_address(1));

        let weather = gateway.insert(&weather_address(), weather_values(1, TEST_DATE)).unwrap();
        assert_eq!(weather, build_weather_item_address(1));

        assert_eq!(*recorder.0.borrow(), vec![location_address(), weather_address()]);
    }

    #[test]
    fn test_insert_normalizes_date_and_exact_date_lookup_finds_it() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        let location_id = insert_location(&gateway);

        gateway.insert(&weather_address(), weather_values(location_id, TEST_DATE + 10 * 3_600_000)).unwrap();

        let stored = gateway.query(&weather_address(), None, None, &[], None).unwrap();
        assert_eq!(stored.iter().next().unwrap().get_i64("date"), Some(TEST_DATE));

        let lookup = build_weather_address_with_exact_date(TEST_LOCATION, TEST_DATE + 22 * 3_600_000);
        let result = gateway.query(&lookup, None, None, &[], None).unwrap();
        assert_eq!(result.len(), 1);

        let row = result.iter().next().unwrap();
        assert_eq!(row.get_str("short_desc"), Some("Asteroids"));
        assert_eq!(row.get_str("city_name"), Some("North Pole"));
        assert_eq!(row.get_i64("weather_id"), Some(321));
    }

    #[test]
    fn test_start_date_query_is_on_or_after() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        let location_id = insert_location(&gateway);
        for day in 0..3 {
            gateway.insert(&weather_address(), weather_values(location_id, TEST_DATE + day * DAY + 5)).unwrap();
        }

        let address = build_weather_address_with_start_date(TEST_LOCATION, TEST_DATE + DAY + 999);
        let result = gateway.query(&address, Some(&["date"]), None, &[], Some("date ASC")).unwrap();

        let dates: Vec<i64> = result.iter().filter_map(|r| r.get_i64("date")).collect();
        assert_eq!(dates, vec![TEST_DATE + DAY, TEST_DATE + 2 * DAY]);
        assert_eq!(result.columns(), ["date".to_string()]);
    }

    #[test]
    fn test_zero_start_date_returns_all_rows_for_location() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        let location_id = insert_location(&gateway);
        gateway.insert(&weather_address(), weather_values(location_id, TEST_DATE)).unwrap();
        gateway.insert(&weather_address(), weather_values(location_id, TEST_DATE + DAY)).unwrap();

        let address = Address::parse("content://com.kenano.android.mysunshine.data/weather/99705?date=0").unwrap();
        assert_eq!(gateway.query(&address, None, None, &[], None).unwrap().len(), 2);
        assert_eq!(gateway.query(&build_weather_address(TEST_LOCATION), None, None, &[], None).unwrap().len(), 2);
        assert_eq!(gateway.query(&build_weather_address("elsewhere"), None, None, &[], None).unwrap().len(), 0);
    }

    #[test]
    fn test_query_result_is_bound_to_address() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        let address = build_weather_address(TEST_LOCATION);

        let result = gateway.query(&address, None, None, &[], None).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.address(), &address);
    }

    #[test]
    fn test_unfiltered_query_uses_caller_selection() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        insert_location(&gateway);

        let args = [FieldValue::from("North Pole")];
        let result = gateway.query(&location_address(), Some(&["location_setting"]), Some("city_name = ?"), &args, None).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.iter().next().unwrap().get_str("location_setting"), Some(TEST_LOCATION));
    }

    #[test]
    fn test_read_errors_propagate() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        let result = gateway.query(&weather_address(), None, Some("no_such_column = 1"), &[], None);

        assert!(matches!(result, Err(GatewayError::Database(DBError::Sqlite(_)))));
    }

    #[test]
    fn test_update_notifies_only_when_rows_changed() {
        let recorder = Recorder::default();
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), &recorder);
        let location_id = insert_location(&gateway);
        gateway.insert(&weather_address(), weather_values(location_id, TEST_DATE)).unwrap();
        let before = recorder.count();

        let changes = Fields::new().with("date", TEST_DATE + DAY + 1234);
        let updated = gateway.update(&weather_address(), changes.clone(), Some("_id = ?"), &[FieldValue::from(1)]).unwrap();
        assert_eq!(updated, 1);
        assert_eq!(recorder.count(), before + 1);

        let row = gateway.query(&weather_address(), None, None, &[], None).unwrap();
        assert_eq!(row.iter().next().unwrap().get_i64("date"), Some(TEST_DATE + DAY));

        let updated = gateway.update(&weather_address(), changes, Some("_id = ?"), &[FieldValue::from(42)]).unwrap();
        assert_eq!(updated, 0);
        assert_eq!(recorder.count(), before + 1);
    }

    #[test]
    fn test_delete_all_reports_row_count() {
        let recorder = Recorder::default();
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), &recorder);
        let location_id = insert_location(&gateway);
        for day in 0..4 {
            gateway.insert(&weather_address(), weather_values(location_id, TEST_DATE + day * DAY)).unwrap();
        }
        let before = recorder.count();

        assert_eq!(gateway.delete(&weather_address(), None, &[]).unwrap(), 4);
        assert_eq!(recorder.count(), before + 1);
        assert!(gateway.query(&weather_address(), None, None, &[], None).unwrap().is_empty());

        // Already empty: nothing removed, nothing notified
        assert_eq!(gateway.delete(&weather_address(), None, &[]).unwrap(), 0);
        assert_eq!(recorder.count(), before + 1);
    }

    #[test]
    fn test_delete_with_selection() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        let location_id = insert_location(&gateway);
        gateway.insert(&weather_address(), weather_values(location_id, TEST_DATE)).unwrap();
        gateway.insert(&weather_address(), weather_values(location_id, TEST_DATE + DAY)).unwrap();

        let deleted = gateway.delete(&weather_address(), Some("date = ?"), &[FieldValue::from(TEST_DATE)]).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(gateway.query(&weather_address(), None, None, &[], None).unwrap().len(), 1);
    }

    #[test]
    fn test_writes_to_filtered_addresses_are_rejected() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        let address = build_weather_address(TEST_LOCATION);

        assert!(matches!(
            gateway.insert(&address, weather_values(1, TEST_DATE)),
            Err(GatewayError::UnsupportedOperation(_))
        ));
        assert!(matches!(gateway.delete(&address, None, &[]), Err(GatewayError::UnsupportedOperation(_))));
    }

    #[test]
    fn test_unknown_address_fails_loudly() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        let address = Address::collection("givemeroot");

        assert!(matches!(
            gateway.query(&address, None, None, &[], None),
            Err(GatewayError::Address(AddressError::UnknownAddress(_)))
        ));
        assert!(matches!(
            gateway.insert(&address, location_values()),
            Err(GatewayError::Address(AddressError::UnknownAddress(_)))
        ));
        assert!(gateway.resource_type(&address).is_err());
    }

    #[test]
    fn test_invalid_date_field_is_rejected() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        let location_id = insert_location(&gateway);

        for date in [FieldValue::from("yesterday"), FieldValue::Real(f64::NAN), FieldValue::Real(f64::INFINITY), FieldValue::Null] {
            let values = weather_values(location_id, TEST_DATE).with("date", date);
            assert!(matches!(gateway.insert(&weather_address(), values), Err(GatewayError::InvalidField(_))));
        }
        assert!(gateway.query(&weather_address(), None, None, &[], None).unwrap().is_empty());
    }

    #[test]
    fn test_real_date_field_is_truncated_and_normalized() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);
        let location_id = insert_location(&gateway);
        let values = weather_values(location_id, TEST_DATE).with("date", (TEST_DATE + 5000) as f64);

        gateway.insert(&weather_address(), values).unwrap();
        let result = gateway.query(&weather_address(), None, None, &[], None).unwrap();
        assert_eq!(result.iter().next().unwrap().get_i64("date"), Some(TEST_DATE));
    }

    /// Store whose inserts never produce a usable row id
    struct NoRowStore(Option<i64>);

    impl RelationalStore for NoRowStore {
        fn query(&self, _table: &str, _select: &Select) -> Result<QueryResult, DBError> {
            Ok(QueryResult::default())
        }

        fn query_join(&self, _tables: &str, _select: &Select) -> Result<QueryResult, DBError> {
            Ok(QueryResult::default())
        }

        fn insert(&self, _table: &str, _values: &Fields) -> Result<Option<i64>, DBError> {
            Ok(self.0)
        }

        fn update(&self, _table: &str, _values: &Fields, _selection: Option<&str>, _args: &[FieldValue]) -> Result<usize, DBError> {
            Ok(0)
        }

        fn delete(&self, _table: &str, _selection: Option<&str>, _args: &[FieldValue]) -> Result<usize, DBError> {
            Ok(0)
        }
    }

    #[test]
    fn test_insert_without_row_id_is_a_write_error() {
        for row_id in [None, Some(0)] {
            let recorder = Recorder::default();
            let gateway = StorageGateway::new(NoRowStore(row_id), &recorder);

            for address in [weather_address(), location_address()] {
                match gateway.insert(&address, weather_values(1, TEST_DATE)) {
                    Err(GatewayError::Write(msg)) => assert!(msg.contains(&address.to_string()), "{}", msg),
                    other => panic!("expected a write error, got {:?}", other),
                }
            }
            assert_eq!(recorder.count(), 0);
        }
    }

    #[test]
    fn test_empty_store_mutations_do_not_notify() {
        let recorder = Recorder::default();
        let gateway = StorageGateway::new(NoRowStore(None), &recorder);

        assert_eq!(gateway.update(&location_address(), location_values(), None, &[]).unwrap(), 0);
        assert_eq!(gateway.delete(&location_address(), None, &[]).unwrap(), 0);
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_resource_types() {
        let gateway = StorageGateway::new(DB::in_memory().unwrap(), LogSink);

        assert_eq!(gateway.resource_type(&build_weather_address_with_exact_date(TEST_LOCATION, TEST_DATE)).unwrap(), WEATHER_CONTENT_ITEM_TYPE);
        assert_eq!(gateway.resource_type(&build_weather_address(TEST_LOCATION)).unwrap(), WEATHER_CONTENT_TYPE);
        assert_eq!(gateway.resource_type(&weather_address()).unwrap(), WEATHER_CONTENT_TYPE);
        assert_eq!(gateway.resource_type(&location_address()).unwrap(), LOCATION_CONTENT_TYPE);
    }
}
