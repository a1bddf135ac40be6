pub mod errors;
pub mod models;
pub mod schema;

use std::time::Duration;
use log::debug;
use rusqlite::{params_from_iter, Connection};
use crate::manager_db::errors::DBError;
use crate::manager_db::models::{FieldValue, Fields, QueryResult};

/// Everything a select needs besides the table clause
///
/// Unset parts are left out of the statement; an absent or empty projection selects all columns.
#[derive(Debug, Default, Clone, Copy)]
pub struct Select<'a> {
    pub projection: Option<&'a [&'a str]>,
    pub selection: Option<&'a str>,
    pub selection_args: &'a [FieldValue],
    pub group_by: Option<&'a str>,
    pub having: Option<&'a str>,
    pub order_by: Option<&'a str>,
}

/// The relational operations the storage gateway relies on
pub trait RelationalStore {
    /// Selects from a single table
    fn query(&self, table: &str, select: &Select) -> Result<QueryResult, DBError>;

    /// Selects from a pre-composed tables clause, e.g. an inner join
    fn query_join(&self, tables: &str, select: &Select) -> Result<QueryResult, DBError>;

    /// Inserts one row and returns its row id, or None if nothing was written
    fn insert(&self, table: &str, values: &Fields) -> Result<Option<i64>, DBError>;

    /// Returns the number of rows updated
    fn update(&self, table: &str, values: &Fields, selection: Option<&str>, selection_args: &[FieldValue]) -> Result<usize, DBError>;

    /// Returns the number of rows deleted, an absent selection deletes all rows
    fn delete(&self, table: &str, selection: Option<&str>, selection_args: &[FieldValue]) -> Result<usize, DBError>;
}

/// SQLite backed store
pub struct DB {
    db_conn: Connection,
}

impl DB {

    /// Opens (or creates) the database file and makes sure the schema is in place
    ///
    /// # Arguments
    ///
    /// * 'db_path' - full path to db file
    pub fn new(db_path: &str) -> Result<Self, DBError> {
        let db_conn = Connection::open(db_path)?;

        // One writer at a time, readers are not blocked by it
        db_conn.busy_timeout(Duration::from_secs(5))?;
        let mode: String = db_conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("opened {} in journal mode {}", db_path, mode);

        schema::initialize(&db_conn)?;

        Ok(DB { db_conn })
    }

    /// Opens a private in-memory database with the schema in place
    pub fn in_memory() -> Result<Self, DBError> {
        let db_conn = Connection::open_in_memory()?;
        schema::initialize(&db_conn)?;

        Ok(DB { db_conn })
    }

    fn select(&self, from: &str, select: &Select) -> Result<QueryResult, DBError> {
        let sql = build_select(from, select);
        debug!("query: {}", sql);

        let mut stmt = self.db_conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut result = QueryResult { columns, rows: Vec::new() };
        let mut rows = stmt.query(params_from_iter(select.selection_args.iter()))?;

        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(result.columns.len());
            for i in 0..result.columns.len() {
                values.push(FieldValue::from(row.get_ref(i)?));
            }
            result.rows.push(values);
        }

        Ok(result)
    }
}

impl RelationalStore for DB {
    fn query(&self, table: &str, select: &Select) -> Result<QueryResult, DBError> {
        self.select(&quote_identifier(table), select)
    }

    fn query_join(&self, tables: &str, select: &Select) -> Result<QueryResult, DBError> {
        self.select(tables, select)
    }

    fn insert(&self, table: &str, values: &Fields) -> Result<Option<i64>, DBError> {
        let sql = if values.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table))
        } else {
            let columns: Vec<String> = values.iter().map(|(c, _)| quote_identifier(c)).collect();
            let placeholders = vec!["?"; values.len()].join(", ");
            format!("INSERT INTO {} ({}) VALUES ({})", quote_identifier(table), columns.join(", "), placeholders)
        };
        debug!("insert: {}", sql);

        let changed = self.db_conn.execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))?;
        if changed == 0 {
            return Ok(None);
        }

        Ok(Some(self.db_conn.last_insert_rowid()))
    }

    fn update(&self, table: &str, values: &Fields, selection: Option<&str>, selection_args: &[FieldValue]) -> Result<usize, DBError> {
        if values.is_empty() {
            return Err(DBError::InvalidStatement(format!("no values to update in {}", table)));
        }

        let assignments: Vec<String> = values.iter()
            .map(|(c, _)| format!("{} = ?", quote_identifier(c)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {}{}",
            quote_identifier(table),
            assignments.join(", "),
            where_clause(selection)
        );
        debug!("update: {}", sql);

        let params = values.iter().map(|(_, v)| v).chain(selection_args.iter());
        Ok(self.db_conn.execute(&sql, params_from_iter(params))?)
    }

    fn delete(&self, table: &str, selection: Option<&str>, selection_args: &[FieldValue]) -> Result<usize, DBError> {
        let sql = format!("DELETE FROM {}{}", quote_identifier(table), where_clause(selection));
        debug!("delete: {}", sql);

        Ok(self.db_conn.execute(&sql, params_from_iter(selection_args.iter()))?)
    }
}

fn build_select(from: &str, select: &Select) -> String {
    let columns = match select.projection {
        Some(p) if !p.is_empty() => p.join(", "),
        _ => "*".to_string(),
    };

    let mut sql = format!("SELECT {} FROM {}{}", columns, from, where_clause(select.selection));
    if let Some(group_by) = non_blank(select.group_by) {
        sql.push_str(" GROUP BY ");
        sql.push_str(group_by);
    }
    if let Some(having) = non_blank(select.having) {
        sql.push_str(" HAVING ");
        sql.push_str(having);
    }
    if let Some(order_by) = non_blank(select.order_by) {
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by);
    }

    sql
}

fn where_clause(selection: Option<&str>) -> String {
    non_blank(selection).map_or(String::new(), |s| format!(" WHERE {}", s))
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
