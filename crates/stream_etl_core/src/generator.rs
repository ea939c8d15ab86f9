//! Synthetic retail event generation.
//!
//! All randomness is drawn from the caller's RNG so a seeded generator
//! reproduces the same event sequence.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use uuid::Builder;

use crate::contract::{
    round_to_cents, EventType, OrderKind, StoreEvent, StoreRef, EVENT_CONTACT,
};

pub const ACTOR_NAMES: [&str; 24] = [
    "Aarakocra",
    "Aasimar",
    "Beholder",
    "Bugbear",
    "Centaur",
    "Changeling",
    "Deep Gnome",
    "Deva",
    "Dragonborn",
    "Drow",
    "Dwarf",
    "Eladrin",
    "Elf",
    "Firbolg",
    "Genasi",
    "Githzerai",
    "Gnoll",
    "Gnome",
    "Goblin",
    "Goliath",
    "Hag",
    "Half-Elf",
    "Half-Orc",
    "Halfling",
];

pub const CATEGORIES: [&str; 16] = [
    "Books",
    "Games",
    "Mobiles",
    "Groceries",
    "Shoes",
    "Stationaries",
    "Laptops",
    "Tablets",
    "Notebooks",
    "Camera",
    "Printers",
    "Monitors",
    "Speakers",
    "Projectors",
    "Cables",
    "Furniture",
];

pub const STORE_COUNT: u32 = 5;
pub const MAX_SALES_AMOUNT: f64 = 100.0;

/// A roll in `1..=100` above this value produces a malformed event (10%).
pub const MALFORMED_ROLL_THRESHOLD: u32 = 90;

/// Builds one event. When `inject_malformed` is set, roughly one event in ten
/// loses its `store_id` and is flagged with `bad_msg`.
pub fn generate_event<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    inject_malformed: bool,
) -> StoreEvent {
    let sales = round_to_cents(rng.gen::<f64>() * MAX_SALES_AMOUNT);
    let evnt_type = EventType::ALL[rng.gen_range(0..EventType::ALL.len())];
    let request_id = Builder::from_random_bytes(rng.gen())
        .into_uuid()
        .to_string();
    let name = ACTOR_NAMES[rng.gen_range(0..ACTOR_NAMES.len())];
    let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
    let store_id = format!("store_{}", rng.gen_range(1..=STORE_COUNT));

    let order = if rng.gen::<bool>() {
        OrderKind::Return
    } else {
        OrderKind::NewOrder
    };

    let store = if malformed_roll(rng, inject_malformed) {
        StoreRef::Missing
    } else {
        StoreRef::Known(store_id)
    };

    StoreEvent {
        request_id,
        name: name.to_string(),
        category: category.to_string(),
        store,
        evnt_time: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        evnt_type,
        order,
        sales,
        contact_me: EVENT_CONTACT.to_string(),
    }
}

fn malformed_roll<R: Rng + ?Sized>(rng: &mut R, inject_malformed: bool) -> bool {
    inject_malformed && rng.gen_range(1..=100u32) > MALFORMED_ROLL_THRESHOLD
}
