//! # sheetmail-sheets
//!
//! Spreadsheet access: OAuth credentials ([`auth`]) and grid fetching
//! ([`fetcher`]) against the Google Sheets v4 API.

pub mod auth;
pub mod error;
pub mod fetcher;

pub use auth::{AccessToken, ClientSecrets, CredentialProvider, OAuthCredentialProvider, StoredToken};
pub use error::SheetsError;
pub use fetcher::{FetchRequest, GoogleSheetsFetcher, SpreadsheetFetcher, StaticFetcher};
