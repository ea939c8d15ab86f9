//! AWS-oriented adapters and handlers for the stream ETL pipeline.
//!
//! This crate owns runtime integration details (Lambda handlers, stream and
//! storage adapter seams, log setup). Domain types and event generation live
//! in `stream_etl_core`.

pub mod adapters;
pub mod handlers;
pub mod telemetry;
