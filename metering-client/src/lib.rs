//! metering-client: submit usage documents to a metering collector and read
//! aggregated usage reports back.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use error::ClientError;
