#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Mutex;

use stream_etl_core::config::{LogLevel, ProducerConfig, StreamEtlConfig};
use stream_etl_lambda::adapters::budget::InvocationBudget;
use stream_etl_lambda::adapters::object_store::ObjectStore;
use stream_etl_lambda::adapters::stream_sink::{PutRecordReceipt, StreamSink};

/// Reports a healthy budget for `iterations` checks, then zero.
pub struct IterationBudget {
    remaining_checks: Cell<u64>,
}

impl IterationBudget {
    pub fn new(iterations: u64) -> Self {
        Self {
            remaining_checks: Cell::new(iterations),
        }
    }
}

impl InvocationBudget for IterationBudget {
    fn remaining_millis(&self) -> u64 {
        let left = self.remaining_checks.get();
        if left == 0 {
            return 0;
        }
        self.remaining_checks.set(left - 1);
        30_000
    }
}

/// Always reports the same remaining time.
pub struct FixedBudget(pub u64);

impl InvocationBudget for FixedBudget {
    fn remaining_millis(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub stream_name: String,
    pub partition_key: String,
    pub data: Vec<u8>,
}

/// Records every put and fails the put whose 1-based position is `fail_on`.
pub struct RecordingSink {
    records: Mutex<Vec<SentRecord>>,
    attempts: Mutex<usize>,
    fail_on: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            fail_on: None,
        }
    }

    pub fn failing_on(attempt: usize) -> Self {
        Self {
            fail_on: Some(attempt),
            ..Self::new()
        }
    }

    pub fn records(&self) -> Vec<SentRecord> {
        self.records.lock().expect("poisoned mutex").clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().expect("poisoned mutex")
    }
}

impl StreamSink for RecordingSink {
    fn put_record(
        &self,
        stream_name: &str,
        partition_key: &str,
        data: &[u8],
    ) -> Result<PutRecordReceipt, String> {
        let mut attempts = self.attempts.lock().expect("poisoned mutex");
        *attempts += 1;
        if self.fail_on == Some(*attempts) {
            return Err("ProvisionedThroughputExceededException: rate exceeded".to_string());
        }

        let mut records = self.records.lock().expect("poisoned mutex");
        records.push(SentRecord {
            stream_name: stream_name.to_string(),
            partition_key: partition_key.to_string(),
            data: data.to_vec(),
        });
        Ok(PutRecordReceipt {
            shard_id: "shardId-000000000000".to_string(),
            sequence_number: format!("4959{:016}", records.len()),
        })
    }
}

pub struct RecordingStore {
    writes: Mutex<HashMap<String, Vec<u8>>>,
    denied_suffix: Option<&'static str>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            writes: Mutex::new(HashMap::new()),
            denied_suffix: None,
        }
    }

    pub fn denying(suffix: &'static str) -> Self {
        Self {
            denied_suffix: Some(suffix),
            ..Self::new()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .writes
            .lock()
            .expect("poisoned mutex")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.writes
            .lock()
            .expect("poisoned mutex")
            .get(key)
            .cloned()
    }
}

impl ObjectStore for RecordingStore {
    fn write_object(&self, key: &str, body: &[u8]) -> Result<(), String> {
        if let Some(suffix) = self.denied_suffix {
            if key.ends_with(suffix) {
                return Err(format!("simulated write failure for key: {key}"));
            }
        }

        self.writes
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), body.to_vec());
        Ok(())
    }
}

pub fn producer_config() -> ProducerConfig {
    ProducerConfig {
        log_level: LogLevel::Info,
        stream_name: "data_pipe_stream".to_string(),
        region: None,
        max_msgs_to_produce: 5,
        trigger_random_failures: true,
        seed: None,
    }
}

pub fn stream_etl_config() -> StreamEtlConfig {
    StreamEtlConfig {
        log_level: LogLevel::Info,
        bucket: "raw-data-bkt".to_string(),
        prefix: "stream-etl".to_string(),
    }
}
