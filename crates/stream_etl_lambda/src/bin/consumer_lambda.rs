use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use stream_etl_core::config::ConsumerConfig;
use stream_etl_core::contract::HandlerResponse;
use stream_etl_lambda::handlers::consumer::handle_consumer_event;
use stream_etl_lambda::telemetry::init_tracing;

async fn handle_request(event: LambdaEvent<Value>) -> Result<HandlerResponse, Error> {
    handle_consumer_event(&event.payload).map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ConsumerConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    init_tracing(config.log_level);
    tracing::info!(
        component = "consumer_lambda",
        event = "cold_start",
        reliable_queue_name = config.reliable_queue_name.as_deref(),
    );

    lambda_runtime::run(service_fn(handle_request)).await
}
