use chrono::Utc;

pub trait InvocationBudget {
    fn remaining_millis(&self) -> u64;
}

/// Remaining time measured against the Lambda context deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineBudget {
    deadline_epoch_ms: u64,
}

impl DeadlineBudget {
    pub fn new(deadline_epoch_ms: u64) -> Self {
        Self { deadline_epoch_ms }
    }

    pub fn remaining_at(&self, now_epoch_ms: i64) -> u64 {
        let now = u64::try_from(now_epoch_ms).unwrap_or(0);
        self.deadline_epoch_ms.saturating_sub(now)
    }
}

impl InvocationBudget for DeadlineBudget {
    fn remaining_millis(&self) -> u64 {
        self.remaining_at(Utc::now().timestamp_millis())
    }
}
