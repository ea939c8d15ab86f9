use serde_json::Value;
use stream_etl_core::contract::{message_response, ConsumerAck, HandlerResponse};

const COMPONENT: &str = "consumer_handler";

/// Acknowledges an event delivered by the routing rule. The payload is logged
/// and otherwise left untouched.
pub fn handle_consumer_event(event: &Value) -> Result<HandlerResponse, serde_json::Error> {
    let payload = serde_json::to_string(event)?;
    let detail_type = event.get("detail-type").and_then(Value::as_str);
    tracing::info!(
        component = COMPONENT,
        event = "event_received",
        detail_type = detail_type,
        payload = %payload,
    );

    let ack = ConsumerAck { status: true };
    tracing::info!(
        component = COMPONENT,
        event = "event_acknowledged",
        status = ack.status,
    );

    message_response(ack)
}
