use std::time::Instant;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use stream_etl_core::config::ProducerConfig;
use stream_etl_core::contract::{message_response, HandlerResponse, ProducerSummary, StoreEvent};
use stream_etl_core::generator::generate_event;

use crate::adapters::budget::InvocationBudget;
use crate::adapters::stream_sink::StreamSink;

/// The loop stops once the invocation has this little time left.
pub const MIN_REMAINING_MILLIS: u64 = 100;

const COMPONENT: &str = "producer_handler";

/// RNG for the lifetime of a warm container. Built once at cold start and
/// shared by every invocation, so a fixed seed never replays request ids.
pub fn producer_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Logs the incoming trigger, produces until the budget runs out and wraps the
/// summary in a 200 envelope. Send failures are reported inside the summary,
/// never as a failed invocation.
pub fn handle_producer_invocation<R: Rng + ?Sized>(
    trigger: &Value,
    config: &ProducerConfig,
    budget: &impl InvocationBudget,
    sink: &impl StreamSink,
    rng: &mut R,
) -> Result<HandlerResponse, serde_json::Error> {
    let trigger = serde_json::to_string(trigger)?;
    tracing::info!(
        component = COMPONENT,
        event = "invocation_received",
        trigger = %trigger,
    );

    let summary = produce_events(config, budget, sink, rng);
    message_response(&summary)
}

pub fn produce_events<R: Rng + ?Sized>(
    config: &ProducerConfig,
    budget: &impl InvocationBudget,
    sink: &impl StreamSink,
    rng: &mut R,
) -> ProducerSummary {
    let started_at = Instant::now();
    let mut summary = ProducerSummary::default();
    tracing::info!(
        component = COMPONENT,
        event = "producer_started",
        stream_name = %config.stream_name,
        inject_malformed = config.trigger_random_failures,
    );

    loop {
        let remaining_ms = budget.remaining_millis();
        if remaining_ms <= MIN_REMAINING_MILLIS {
            break;
        }
        tracing::debug!(component = COMPONENT, remaining_ms = remaining_ms);

        let event = generate_event(&mut *rng, Utc::now(), config.trigger_random_failures);

        if let Err(error_message) = send_event(&event, config, sink) {
            tracing::error!(
                component = COMPONENT,
                event = "producer_failed",
                stream_name = %config.stream_name,
                messages_sent = summary.messages_sent,
                duration_ms = started_at.elapsed().as_millis() as u64,
                error = %error_message,
            );
            summary.error_message = Some(error_message);
            return summary;
        }

        summary.record_sent(&event);
    }

    summary.status = true;
    tracing::info!(
        component = COMPONENT,
        event = "producer_completed",
        duration_ms = started_at.elapsed().as_millis() as u64,
        msg_cnt = summary.messages_sent,
        bad_msgs = summary.malformed_messages,
        sale_evnts = summary.sales_events,
        inventory_evnts = summary.inventory_events,
        tot_sales = summary.total_sales,
    );
    summary
}

fn send_event(
    event: &StoreEvent,
    config: &ProducerConfig,
    sink: &impl StreamSink,
) -> Result<(), String> {
    let data = serde_json::to_vec(event)
        .map_err(|error| format!("Failed to serialize event {}: {error}", event.request_id))?;
    tracing::info!(
        component = COMPONENT,
        event = "record_prepared",
        request_id = %event.request_id,
        evnt_type = event.evnt_type.as_str(),
        malformed = event.store.is_malformed(),
        sales = event.sales,
    );

    let receipt = sink.put_record(&config.stream_name, &event.request_id, &data)?;
    tracing::info!(
        component = COMPONENT,
        event = "record_sent",
        partition_key = %event.request_id,
        shard_id = %receipt.shard_id,
        sequence_number = %receipt.sequence_number,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use stream_etl_core::config::LogLevel;

    use super::*;
    use crate::adapters::stream_sink::PutRecordReceipt;

    struct ConstantBudget(u64);

    impl InvocationBudget for ConstantBudget {
        fn remaining_millis(&self) -> u64 {
            self.0
        }
    }

    /// Refuses every put; reaching it at all is observable in the summary.
    struct RejectingSink;

    impl StreamSink for RejectingSink {
        fn put_record(&self, _: &str, _: &str, _: &[u8]) -> Result<PutRecordReceipt, String> {
            Err("ResourceNotFoundException: stream not found".to_string())
        }
    }

    fn sample_config() -> ProducerConfig {
        ProducerConfig {
            log_level: LogLevel::Info,
            stream_name: "data_pipe_test".to_string(),
            region: None,
            max_msgs_to_produce: 5,
            trigger_random_failures: true,
            seed: None,
        }
    }

    #[test]
    fn first_send_failure_stops_with_empty_counts() {
        let mut rng = producer_rng(Some(5));
        let summary = produce_events(
            &sample_config(),
            &ConstantBudget(60_000),
            &RejectingSink,
            &mut rng,
        );

        assert!(!summary.status);
        assert_eq!(summary.messages_sent, 0);
        assert_eq!(summary.total_sales, 0.0);
        assert_eq!(
            summary.error_message.as_deref(),
            Some("ResourceNotFoundException: stream not found")
        );
    }

    #[test]
    fn budget_just_above_margin_still_attempts_a_send() {
        let mut rng = producer_rng(Some(5));
        let summary = produce_events(
            &sample_config(),
            &ConstantBudget(MIN_REMAINING_MILLIS + 1),
            &RejectingSink,
            &mut rng,
        );

        assert!(summary.error_message.is_some());
    }

    #[test]
    fn shared_rng_yields_fresh_request_ids_per_draw() {
        let mut rng = producer_rng(Some(42));
        let first = generate_event(&mut rng, Utc::now(), true);
        let second = generate_event(&mut rng, Utc::now(), true);

        assert_ne!(first.request_id, second.request_id);
    }
}
