use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutRecordReceipt {
    pub shard_id: String,
    pub sequence_number: String,
}

pub trait StreamSink {
    fn put_record(
        &self,
        stream_name: &str,
        partition_key: &str,
        data: &[u8],
    ) -> Result<PutRecordReceipt, String>;
}
