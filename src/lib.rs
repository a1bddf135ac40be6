//! Local store for weather forecasts and locations.
//!
//! Records are reached through addresses such as `content://<authority>/weather/94043`.
//! The [`router`] turns an address into a query against the SQLite tables and the
//! [`gateway::StorageGateway`] is the single entry point for reads and writes.

pub mod addressing;
pub mod errors;
pub mod formatting;
pub mod gateway;
pub mod initialization;
pub mod logging;
pub mod manager_db;
pub mod router;
