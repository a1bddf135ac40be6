use std::fmt;

/// Errors raised while building, parsing or classifying an address
///
#[derive(Debug, Clone, PartialEq)]
pub enum AddressError {
    UnknownAddress(String),
    MalformedDate(String),
    InvalidAddress(String),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AddressError::UnknownAddress(e) => write!(f, "AddressError::UnknownAddress: {}", e),
            AddressError::MalformedDate(e) => write!(f, "AddressError::MalformedDate: {}", e),
            AddressError::InvalidAddress(e) => write!(f, "AddressError::InvalidAddress: {}", e),
        }
    }
}
impl From<url::ParseError> for AddressError {
    fn from(e: url::ParseError) -> Self {
        AddressError::InvalidAddress(e.to_string())
    }
}
impl From<std::string::FromUtf8Error> for AddressError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        AddressError::InvalidAddress(e.to_string())
    }
}
