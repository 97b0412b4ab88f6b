//! sheetmail core library: grid and record types, grid → record conversion,
//! run settings, errors.
//!
//! - [`types`]: newtypes and domain structs
//! - [`records`]: [`to_records`]
//! - [`config`]: [`Settings`]
//! - [`error`]: [`CoreError`]

pub mod config;
pub mod error;
pub mod records;
pub mod types;

pub use config::Settings;
pub use error::CoreError;
pub use records::{to_records, to_records_from_token};
pub use types::{
    FieldNames, Grid, Orientation, Record, RecordBatch, RunConfig, RunId, SheetId,
};
