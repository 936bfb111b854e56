use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of a single admission attempt against a bucket.
///
/// Rejection is an expected result, not an error: callers branch on the
/// variant. `wait` hints at when the next token accrues; it does not reserve
/// that token for the rejected caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Decision {
    Admitted {
        remaining_tokens: u64,
    },
    Rejected {
        remaining_tokens: u64,
        wait: Duration,
    },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted { .. })
    }

    pub fn remaining_tokens(&self) -> u64 {
        match *self {
            Decision::Admitted { remaining_tokens }
            | Decision::Rejected {
                remaining_tokens, ..
            } => remaining_tokens,
        }
    }
}
