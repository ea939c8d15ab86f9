use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use stream_etl_core::config::StreamEtlConfig;
use stream_etl_lambda::adapters::object_store::ObjectStore;
use stream_etl_lambda::handlers::stream_etl::{handle_stream_batch, is_kinesis_event, BatchOutcome};
use stream_etl_lambda::telemetry::init_tracing;

struct S3ObjectStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl ObjectStore for S3ObjectStore {
    fn write_object(&self, key: &str, body: &[u8]) -> Result<(), String> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to write object to s3: {error}"))
            })
        })
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &StreamEtlConfig,
    store: &S3ObjectStore,
) -> Result<BatchOutcome, Error> {
    if !is_kinesis_event(&event.payload) {
        return Err(Error::from("stream ETL expects a Kinesis records event"));
    }

    handle_stream_batch(&event.payload, config, Utc::now(), store).map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = StreamEtlConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    init_tracing(config.log_level);
    tracing::info!(
        component = "stream_etl_lambda",
        event = "cold_start",
        bucket = %config.bucket,
        prefix = %config.prefix,
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3ObjectStore {
        bucket: config.bucket.clone(),
        s3_client: aws_sdk_s3::Client::new(&aws_config),
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &config, &store))).await
}
