use std::fmt;
use std::fmt::Formatter;

/// Errors from the relational store, the underlying SQLite error is kept as is
///
#[derive(Debug)]
pub enum DBError {
    Sqlite(rusqlite::Error),
    Schema(String),
    InvalidStatement(String),
}

impl fmt::Display for DBError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DBError::Sqlite(e) => write!(f, "DBError::Sqlite: {}", e),
            DBError::Schema(e) => write!(f, "DBError::Schema: {}", e),
            DBError::InvalidStatement(e) => write!(f, "DBError::InvalidStatement: {}", e),
        }
    }
}
impl From<rusqlite::Error> for DBError {
    fn from(err: rusqlite::Error) -> Self { DBError::Sqlite(err) }
}
