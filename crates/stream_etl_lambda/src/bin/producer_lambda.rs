use std::sync::Mutex;

use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::types::PutRecordsRequestEntry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use rand::rngs::StdRng;
use serde_json::Value;
use stream_etl_core::config::ProducerConfig;
use stream_etl_core::contract::HandlerResponse;
use stream_etl_lambda::adapters::budget::DeadlineBudget;
use stream_etl_lambda::adapters::stream_sink::{PutRecordReceipt, StreamSink};
use stream_etl_lambda::handlers::producer::{handle_producer_invocation, producer_rng};
use stream_etl_lambda::telemetry::init_tracing;

struct KinesisStreamSink {
    kinesis_client: aws_sdk_kinesis::Client,
}

impl StreamSink for KinesisStreamSink {
    fn put_record(
        &self,
        stream_name: &str,
        partition_key: &str,
        data: &[u8],
    ) -> Result<PutRecordReceipt, String> {
        let client = self.kinesis_client.clone();
        let stream_name = stream_name.to_string();
        let partition_key = partition_key.to_string();
        let data = data.to_vec();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let entry = PutRecordsRequestEntry::builder()
                    .data(Blob::new(data))
                    .partition_key(partition_key)
                    .build()
                    .map_err(|error| format!("invalid stream record: {error}"))?;

                let output = client
                    .put_records()
                    .stream_name(stream_name)
                    .records(entry)
                    .send()
                    .await
                    .map_err(|error| format!("failed to put record on stream: {error}"))?;

                let result = output
                    .records()
                    .first()
                    .ok_or_else(|| "stream returned no record result".to_string())?;
                if let Some(code) = result.error_code() {
                    return Err(format!(
                        "stream rejected record ({code}): {}",
                        result.error_message().unwrap_or_default()
                    ));
                }

                Ok(PutRecordReceipt {
                    shard_id: result.shard_id().unwrap_or_default().to_string(),
                    sequence_number: result.sequence_number().unwrap_or_default().to_string(),
                })
            })
        })
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &ProducerConfig,
    sink: &KinesisStreamSink,
    rng: &Mutex<StdRng>,
) -> Result<HandlerResponse, Error> {
    let budget = DeadlineBudget::new(event.context.deadline);
    let mut rng = rng
        .lock()
        .map_err(|_| Error::from("producer rng lock poisoned"))?;

    handle_producer_invocation(&event.payload, config, &budget, sink, &mut *rng)
        .map_err(|error| Error::from(format!("failed to serialize producer response: {error}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ProducerConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    init_tracing(config.log_level);
    tracing::info!(
        component = "producer_lambda",
        event = "cold_start",
        stream_name = %config.stream_name,
        max_msgs_to_produce = config.max_msgs_to_produce,
        trigger_random_failures = config.trigger_random_failures,
    );

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = config.region.clone() {
        loader = loader.region(aws_config::Region::new(region));
    }
    let aws_config = loader.load().await;
    let sink = KinesisStreamSink {
        kinesis_client: aws_sdk_kinesis::Client::new(&aws_config),
    };
    let rng = Mutex::new(producer_rng(config.seed));

    lambda_runtime::run(service_fn(|event| {
        handle_request(event, &config, &sink, &rng)
    }))
    .await
}
