pub mod budget;
pub mod object_store;
pub mod stream_sink;
