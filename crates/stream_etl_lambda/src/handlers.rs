pub mod consumer;
pub mod producer;
pub mod stream_etl;
