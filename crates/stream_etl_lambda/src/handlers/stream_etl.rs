//! Kinesis batch to Parquet writer.
//!
//! Each invocation receives one batch from the stream's event source mapping,
//! writes the decodable events as a single Parquet object under the hourly
//! ingest partition, then records the last consumed sequence number in a
//! checkpoint object. Records that are not valid events are counted and
//! skipped, but still advance the checkpoint. Storage failures fail the
//! invocation so the batch is retried.

use std::sync::Arc;
use std::time::Instant;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stream_etl_core::config::StreamEtlConfig;
use stream_etl_core::contract::{OrderKind, StoreEvent};
use stream_etl_core::storage_keys::{checkpoint_object_key, ingest_object_key};

use crate::adapters::object_store::ObjectStore;

const COMPONENT: &str = "stream_etl_handler";

#[derive(Debug, Clone, PartialEq)]
pub struct IngestRecord {
    pub event: StoreEvent,
    pub partition_key: String,
    pub sequence_number: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedBatch {
    pub records: Vec<IngestRecord>,
    pub rejected: usize,
    pub last_sequence_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub status: String,
    pub records_written: usize,
    pub rejected: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_sequence_number: String,
    pub records_written: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    pub processed_at: String,
}

pub fn is_kinesis_event(event: &Value) -> bool {
    event
        .get("Records")
        .and_then(Value::as_array)
        .map(|records| {
            !records.is_empty()
                && records.iter().all(|record| {
                    record
                        .get("eventSource")
                        .and_then(Value::as_str)
                        .map(|source| source == "aws:kinesis")
                        .unwrap_or(false)
                })
        })
        .unwrap_or(false)
}

pub fn decode_kinesis_records(event: &Value) -> Result<DecodedBatch, String> {
    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .ok_or_else(|| "Kinesis event must include Records array".to_string())?;

    let mut batch = DecodedBatch::default();
    for record in records {
        let kinesis = record
            .get("kinesis")
            .ok_or_else(|| "Kinesis record must include a kinesis object".to_string())?;
        let sequence_number = string_field(kinesis, "sequenceNumber")?;
        let partition_key = string_field(kinesis, "partitionKey")?;
        let data = string_field(kinesis, "data")?;

        batch.last_sequence_number = Some(sequence_number.to_string());
        match decode_event(data) {
            Ok(event) => batch.records.push(IngestRecord {
                event,
                partition_key: partition_key.to_string(),
                sequence_number: sequence_number.to_string(),
            }),
            Err(reason) => {
                batch.rejected += 1;
                tracing::warn!(
                    component = COMPONENT,
                    event = "record_rejected",
                    sequence_number = sequence_number,
                    reason = %reason,
                );
            }
        }
    }

    Ok(batch)
}

pub fn handle_stream_batch(
    event: &Value,
    config: &StreamEtlConfig,
    processed_at: DateTime<Utc>,
    store: &impl ObjectStore,
) -> Result<BatchOutcome, String> {
    let started_at = Instant::now();
    let batch = decode_kinesis_records(event)?;
    tracing::info!(
        component = COMPONENT,
        event = "batch_received",
        decoded = batch.records.len(),
        rejected = batch.rejected,
        last_sequence_number = batch.last_sequence_number.as_deref(),
    );

    let Some(first) = batch.records.first() else {
        // Rejected records were still consumed; keep the checkpoint moving.
        if let Some(last_sequence_number) = &batch.last_sequence_number {
            write_checkpoint(
                store,
                config,
                &Checkpoint {
                    last_sequence_number: last_sequence_number.clone(),
                    records_written: 0,
                    object_key: None,
                    processed_at: processed_at.to_rfc3339(),
                },
            )?;
        }
        tracing::info!(
            component = COMPONENT,
            event = "batch_empty",
            rejected = batch.rejected,
            last_sequence_number = batch.last_sequence_number.as_deref(),
        );
        return Ok(BatchOutcome {
            status: "empty".to_string(),
            records_written: 0,
            rejected: batch.rejected,
            object_key: None,
        });
    };

    let object_key = ingest_object_key(&config.prefix, processed_at, &first.sequence_number);
    let body = serialize_events_parquet(&batch.records)
        .map_err(|error| format!("Failed to serialize batch to parquet: {error}"))?;
    store
        .write_object(&object_key, &body)
        .map_err(|error| format!("Failed to persist batch parquet: {error}"))?;

    write_checkpoint(
        store,
        config,
        &Checkpoint {
            last_sequence_number: batch
                .last_sequence_number
                .clone()
                .unwrap_or_else(|| first.sequence_number.clone()),
            records_written: batch.records.len(),
            object_key: Some(object_key.clone()),
            processed_at: processed_at.to_rfc3339(),
        },
    )?;

    tracing::info!(
        component = COMPONENT,
        event = "batch_written",
        bucket = %config.bucket,
        object_key = %object_key,
        records_written = batch.records.len(),
        rejected = batch.rejected,
        duration_ms = started_at.elapsed().as_millis() as u64,
    );

    Ok(BatchOutcome {
        status: "ok".to_string(),
        records_written: batch.records.len(),
        rejected: batch.rejected,
        object_key: Some(object_key),
    })
}

fn write_checkpoint(
    store: &impl ObjectStore,
    config: &StreamEtlConfig,
    checkpoint: &Checkpoint,
) -> Result<(), String> {
    let body = serde_json::to_vec(checkpoint)
        .map_err(|error| format!("Failed to serialize checkpoint: {error}"))?;
    store
        .write_object(&checkpoint_object_key(&config.prefix), &body)
        .map_err(|error| format!("Failed to persist checkpoint: {error}"))
}

pub fn serialize_events_parquet(records: &[IngestRecord]) -> Result<Vec<u8>, String> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("request_id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("store_id", DataType::Utf8, true),
        Field::new("evnt_time", DataType::Utf8, false),
        Field::new("evnt_type", DataType::Utf8, false),
        Field::new("new_order", DataType::Boolean, true),
        Field::new("is_return", DataType::Boolean, true),
        Field::new("sales", DataType::Float64, false),
        Field::new("bad_msg", DataType::Boolean, true),
        Field::new("contact_me", DataType::Utf8, false),
        Field::new("partition_key", DataType::Utf8, false),
        Field::new("sequence_number", DataType::Utf8, false),
    ]));

    let events = records.iter().map(|record| &record.event);
    let flag = |kind: OrderKind| -> Vec<Option<bool>> {
        records
            .iter()
            .map(|record| (record.event.order == kind).then_some(true))
            .collect()
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            events.clone().map(|e| e.request_id.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            events.clone().map(|e| e.name.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            events.clone().map(|e| e.category.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            events.clone().map(|e| e.store.store_id()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            events.clone().map(|e| e.evnt_time.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            events.clone().map(|e| e.evnt_type.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(BooleanArray::from(flag(OrderKind::NewOrder))),
        Arc::new(BooleanArray::from(flag(OrderKind::Return))),
        Arc::new(Float64Array::from(
            events.clone().map(|e| e.sales).collect::<Vec<_>>(),
        )),
        Arc::new(BooleanArray::from(
            events
                .clone()
                .map(|e| e.store.is_malformed().then_some(true))
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            events.map(|e| e.contact_me.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            records
                .iter()
                .map(|r| r.partition_key.as_str())
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            records
                .iter()
                .map(|r| r.sequence_number.as_str())
                .collect::<Vec<_>>(),
        )),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns)
        .map_err(|error| format!("Failed to build event record batch: {error}"))?;

    let mut buffer = Vec::new();
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, Some(props))
        .map_err(|error| error.to_string())?;
    writer
        .write(&batch)
        .map_err(|error| format!("Failed to write event parquet batch: {error}"))?;
    writer
        .close()
        .map_err(|error| format!("Failed to close event parquet writer: {error}"))?;

    Ok(buffer)
}

fn decode_event(data: &str) -> Result<StoreEvent, String> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|error| format!("invalid base64 record data: {error}"))?;
    serde_json::from_slice(&bytes).map_err(|error| format!("invalid event payload: {error}"))
}

fn string_field<'a>(object: &'a Value, key: &str) -> Result<&'a str, String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Kinesis record field '{key}' must be a string"))
}
