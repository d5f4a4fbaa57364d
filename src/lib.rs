//! Client for creating, filling and sharing Google Sheets.
//!
//! Every call to the Sheets and Drive APIs runs under a [`retry::RetryPolicy`];
//! [`range`] turns blocks of values into the A1 ranges the API expects.

pub mod config;
pub mod error;
pub mod import;
pub mod range;
pub mod retry;
pub mod sheets;
pub mod tabular;

pub use error::{AppError, Result};
