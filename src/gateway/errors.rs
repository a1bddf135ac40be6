use std::fmt;
use crate::addressing::errors::AddressError;
use crate::manager_db::errors::DBError;

#[derive(Debug)]
pub enum GatewayError {
    Address(AddressError),
    Write(String),
    InvalidField(String),
    UnsupportedOperation(String),
    Database(DBError),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GatewayError::Address(e) => write!(f, "GatewayError::Address: {}", e),
            GatewayError::Write(e) => write!(f, "GatewayError::Write: {}", e),
            GatewayError::InvalidField(e) => write!(f, "GatewayError::InvalidField: {}", e),
            GatewayError::UnsupportedOperation(e) => write!(f, "GatewayError::UnsupportedOperation: {}", e),
            GatewayError::Database(e) => write!(f, "GatewayError::Database: {}", e),
        }
    }
}
impl From<AddressError> for GatewayError {
    fn from(e: AddressError) -> Self {
        GatewayError::Address(e)
    }
}
impl From<DBError> for GatewayError {
    fn from(e: DBError) -> Self {
        GatewayError::Database(e)
    }
}
