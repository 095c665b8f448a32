//! HTTP transport
//!
//! A thin wrapper over `reqwest` that normalizes every round-trip into an
//! [`Exchange`].

mod executor;

pub use executor::{Exchange, ExchangeOutcome, HttpErrorMode, RequestExecutor};
