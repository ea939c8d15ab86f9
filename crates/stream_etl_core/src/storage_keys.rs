use chrono::{DateTime, Datelike, Timelike, Utc};

pub const CHECKPOINT_DIR: &str = "checkpoint";
pub const CHECKPOINT_OBJECT: &str = "last_sequence_number.json";

/// Hourly ingest partition for objects written at `ingested_at`, e.g.
/// `stream-etl/ingest_year=2026/ingest_month=02/ingest_day=14/ingest_hour=09`.
pub fn ingest_partition_prefix(base_prefix: &str, ingested_at: DateTime<Utc>) -> String {
    let partitions = format!(
        "ingest_year={:0>4}/ingest_month={:0>2}/ingest_day={:0>2}/ingest_hour={:0>2}",
        ingested_at.year(),
        ingested_at.month(),
        ingested_at.day(),
        ingested_at.hour(),
    );
    join_prefix(base_prefix, &partitions)
}

pub fn ingest_object_key(
    base_prefix: &str,
    ingested_at: DateTime<Utc>,
    first_sequence_number: &str,
) -> String {
    format!(
        "{}/part-{first_sequence_number}.parquet",
        ingest_partition_prefix(base_prefix, ingested_at)
    )
}

pub fn checkpoint_object_key(base_prefix: &str) -> String {
    join_prefix(base_prefix, &format!("{CHECKPOINT_DIR}/{CHECKPOINT_OBJECT}"))
}

fn join_prefix(base_prefix: &str, suffix: &str) -> String {
    let trimmed = base_prefix.trim_matches('/');
    if trimmed.is_empty() {
        suffix.to_string()
    } else {
        format!("{trimmed}/{suffix}")
    }
}
