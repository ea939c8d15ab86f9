use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

pub const EVENT_CONTACT: &str = "github.com/miztiik";
pub const OK_STATUS_CODE: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "sales-events")]
    Sales,
    #[serde(rename = "inventory-events")]
    Inventory,
}

impl EventType {
    pub const ALL: [EventType; 2] = [EventType::Sales, EventType::Inventory];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sales => "sales-events",
            Self::Inventory => "inventory-events",
        }
    }
}

/// Whether the event is a fresh order or a return. Serialized as exactly one
/// of `new_order: true` / `is_return: true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    NewOrder,
    Return,
}

/// Store attribution. A `Missing` store is the malformed-message case and
/// serializes as `bad_msg: true` with no `store_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRef {
    Known(String),
    Missing,
}

impl StoreRef {
    pub fn store_id(&self) -> Option<&str> {
        match self {
            Self::Known(id) => Some(id),
            Self::Missing => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireEvent", try_from = "WireEvent")]
pub struct StoreEvent {
    pub request_id: String,
    pub name: String,
    pub category: String,
    pub store: StoreRef,
    pub evnt_time: String,
    pub evnt_type: EventType,
    pub order: OrderKind,
    pub sales: f64,
    pub contact_me: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventShapeError {
    #[error("event carries both new_order and is_return")]
    AmbiguousOrderKind,
    #[error("event carries neither new_order nor is_return")]
    MissingOrderKind,
    #[error("event carries both store_id and bad_msg")]
    StoreMarkerConflict,
    #[error("event carries neither store_id nor bad_msg")]
    MissingStore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireEvent {
    request_id: String,
    name: String,
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store_id: Option<String>,
    evnt_time: String,
    evnt_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_order: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_return: Option<bool>,
    sales: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bad_msg: Option<bool>,
    #[serde(default)]
    contact_me: String,
}

impl From<StoreEvent> for WireEvent {
    fn from(event: StoreEvent) -> Self {
        let (new_order, is_return) = match event.order {
            OrderKind::NewOrder => (Some(true), None),
            OrderKind::Return => (None, Some(true)),
        };
        let (store_id, bad_msg) = match event.store {
            StoreRef::Known(id) => (Some(id), None),
            StoreRef::Missing => (None, Some(true)),
        };

        Self {
            request_id: event.request_id,
            name: event.name,
            category: event.category,
            store_id,
            evnt_time: event.evnt_time,
            evnt_type: event.evnt_type,
            new_order,
            is_return,
            sales: event.sales,
            bad_msg,
            contact_me: event.contact_me,
        }
    }
}

impl TryFrom<WireEvent> for StoreEvent {
    type Error = EventShapeError;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        let order = match (wire.new_order == Some(true), wire.is_return == Some(true)) {
            (true, false) => OrderKind::NewOrder,
            (false, true) => OrderKind::Return,
            (true, true) => return Err(EventShapeError::AmbiguousOrderKind),
            (false, false) => return Err(EventShapeError::MissingOrderKind),
        };
        let store = match (wire.store_id, wire.bad_msg == Some(true)) {
            (Some(id), false) => StoreRef::Known(id),
            (None, true) => StoreRef::Missing,
            (Some(_), true) => return Err(EventShapeError::StoreMarkerConflict),
            (None, false) => return Err(EventShapeError::MissingStore),
        };

        Ok(Self {
            request_id: wire.request_id,
            name: wire.name,
            category: wire.category,
            store,
            evnt_time: wire.evnt_time,
            evnt_type: wire.evnt_type,
            order,
            sales: wire.sales,
            contact_me: wire.contact_me,
        })
    }
}

/// Counters reported by one producer invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProducerSummary {
    pub status: bool,
    #[serde(rename = "msg_cnt")]
    pub messages_sent: u64,
    #[serde(rename = "bad_msgs")]
    pub malformed_messages: u64,
    #[serde(rename = "sale_evnts")]
    pub sales_events: u64,
    #[serde(rename = "inventory_evnts")]
    pub inventory_events: u64,
    #[serde(rename = "tot_sales")]
    pub total_sales: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProducerSummary {
    pub fn record_sent(&mut self, event: &StoreEvent) {
        self.messages_sent += 1;
        if event.store.is_malformed() {
            self.malformed_messages += 1;
        }
        match event.evnt_type {
            EventType::Sales => self.sales_events += 1,
            EventType::Inventory => self.inventory_events += 1,
        }
        self.total_sales = round_to_cents(self.total_sales + event.sales);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerAck {
    pub status: bool,
}

/// Lambda response envelope shared by the producer and consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Wraps `message` as `{"statusCode": 200, "body": "{\"message\": ...}"}`.
pub fn message_response(message: impl Serialize) -> Result<HandlerResponse, serde_json::Error> {
    let message = serde_json::to_value(message)?;
    Ok(HandlerResponse {
        status_code: OK_STATUS_CODE,
        body: serde_json::to_string(&json!({ "message": message }))?,
    })
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn sample_event(order: OrderKind, store: StoreRef) -> StoreEvent {
        StoreEvent {
            request_id: "3f1c2a6e-0c4b-4d8e-9a59-2f1d7b0c9e11".to_string(),
            name: "Drow".to_string(),
            category: "Books".to_string(),
            store,
            evnt_time: "2026-02-14T10:15:00.000000Z".to_string(),
            evnt_type: EventType::Sales,
            order,
            sales: 42.17,
            contact_me: EVENT_CONTACT.to_string(),
        }
    }

    #[test]
    fn new_order_event_serializes_flat_fields() {
        let event = sample_event(OrderKind::NewOrder, StoreRef::Known("store_3".to_string()));
        let value = serde_json::to_value(&event).expect("event should serialize");

        assert_eq!(value["new_order"], json!(true));
        assert_eq!(value["store_id"], json!("store_3"));
        assert_eq!(value["evnt_type"], json!("sales-events"));
        assert!(value.get("is_return").is_none());
        assert!(value.get("bad_msg").is_none());
    }

    #[test]
    fn malformed_return_event_drops_store_and_marks_bad_msg() {
        let event = sample_event(OrderKind::Return, StoreRef::Missing);
        let value = serde_json::to_value(&event).expect("event should serialize");

        assert_eq!(value["is_return"], json!(true));
        assert_eq!(value["bad_msg"], json!(true));
        assert!(value.get("store_id").is_none());
        assert!(value.get("new_order").is_none());

        let parsed: StoreEvent = serde_json::from_value(value).expect("event should parse");
        assert_eq!(parsed, event);
    }

    #[test]
    fn rejects_event_with_both_order_flags() {
        let payload = json!({
            "request_id": "r-1",
            "name": "Elf",
            "category": "Games",
            "store_id": "store_1",
            "evnt_time": "2026-02-14T10:15:00Z",
            "evnt_type": "inventory-events",
            "new_order": true,
            "is_return": true,
            "sales": 1.5
        });

        let error = serde_json::from_value::<StoreEvent>(payload).expect_err("should fail");
        assert!(error.to_string().contains("both new_order and is_return"));
    }

    #[test]
    fn rejects_event_without_store_or_marker() {
        let payload = json!({
            "request_id": "r-1",
            "name": "Elf",
            "category": "Games",
            "evnt_time": "2026-02-14T10:15:00Z",
            "evnt_type": "inventory-events",
            "new_order": true,
            "sales": 1.5
        });

        let error = serde_json::from_value::<StoreEvent>(payload).expect_err("should fail");
        assert!(error.to_string().contains("neither store_id nor bad_msg"));
    }

    #[test]
    fn summary_uses_wire_names_and_omits_missing_error() {
        let mut summary = ProducerSummary::default();
        summary.record_sent(&sample_event(
            OrderKind::NewOrder,
            StoreRef::Known("store_1".to_string()),
        ));
        summary.record_sent(&sample_event(OrderKind::Return, StoreRef::Missing));
        summary.status = true;

        let value = serde_json::to_value(&summary).expect("summary should serialize");
        assert_eq!(value["msg_cnt"], json!(2));
        assert_eq!(value["bad_msgs"], json!(1));
        assert_eq!(value["sale_evnts"], json!(2));
        assert_eq!(value["inventory_evnts"], json!(0));
        assert_eq!(value["tot_sales"], json!(84.34));
        assert!(value.get("error_message").is_none());
    }

    #[test]
    fn message_response_nests_result_under_message() {
        let response =
            message_response(ConsumerAck { status: true }).expect("response should build");
        assert_eq!(response.status_code, 200);

        let body: Value = serde_json::from_str(&response.body).expect("body should be json");
        assert_eq!(body, json!({"message": {"status": true}}));

        let envelope = serde_json::to_value(&response).expect("envelope should serialize");
        assert_eq!(envelope["statusCode"], json!(200));
    }
}
