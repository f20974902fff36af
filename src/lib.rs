//! Querygate - a guarded, read-only SQL execution gateway.
//!
//! Receives a candidate statement, proves it is safe to run, submits it to
//! an asynchronous query engine, waits under a deadline, and shapes the
//! result into a fixed `{columns, rows, bytes_scanned}` transport form.

pub mod config;
pub mod engine;
pub mod error;
pub mod execute;
pub mod format;
pub mod gateway;
pub mod validate;
