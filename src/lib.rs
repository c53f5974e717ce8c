//! A small Rust client for the Swedish Species Observation System (SOS) API.
//!
//! This crate implements the SOS search flow:
//! build a filter query, ask for a match count, then page through search
//! results or export the matches to a CSV file.
//!
//! ## Quick start
//! - Configure authentication via environment variables (`SOS_API_URL`, `SOS_API_KEY`) or a
//!   `.sosapirc` file (supported in the current directory and in your home directory).
//! - Build a [`Query`] (a bounding date range is required) and hand it to the [`Client`].
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use sosapi::{AreaType, Client, Query, Result};
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!
//!     let uppland = client.get_area_id(AreaType::Province, "Uppland")?;
//!     let mut query = Query::builder()
//!         .provinces(vec![uppland])
//!         .taxons(vec![100017])
//!         .start_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
//!         .end_date(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap())
//!         .build()?;
//!
//!     for observation in client.get_observations(&mut query)? {
//!         println!("{:?}", observation);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For full usage and configuration details, see the crate README.

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod query;

pub use client::{Client, ClientConfig, DEFAULT_OUTPUT_FIELDS, Observation};
pub use error::{Error, Result};
pub use query::{AreaType, DateFilterType, Provider, Query, QueryBuilder};
