//! Retry policy: decides whether a failed attempt is retried.

/// What to do with an item whose attempt just failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Back to pending with the new retry count.
    Retry { retry_count: u32 },
    /// Out of retries; the item becomes failed.
    GiveUp,
}

/// Retry policy for failed attempts.
///
/// Retries are immediate and in place: the item keeps its queue slot and is
/// picked up again on the next scan pass. There is no backoff delay because
/// the other pending items already space the attempts out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Decide based on how many retries the item has already used.
    ///
    /// With `max_retries = 3` an item is attempted four times: the first three
    /// failures bump `retry_count` to 1, 2, 3 and the fourth gives up.
    pub fn decide(&self, retry_count: u32) -> RetryDecision {
        if retry_count < self.max_retries {
            RetryDecision::Retry {
                retry_count: retry_count + 1,
            }
        } else {
            RetryDecision::GiveUp
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_policy_allows_three_retries() {
        assert_eq!(RetryPolicy::default().max_retries, 3);
    }

    #[rstest]
    #[case(0, RetryDecision::Retry { retry_count: 1 })]
    #[case(1, RetryDecision::Retry { retry_count: 2 })]
    #[case(2, RetryDecision::Retry { retry_count: 3 })]
    #[case(3, RetryDecision::GiveUp)]
    fn decisions_with_default_cap(#[case] used: u32, #[case] expected: RetryDecision) {
        assert_eq!(RetryPolicy::default().decide(used), expected);
    }

    #[test]
    fn zero_retries_gives_up_immediately() {
        assert_eq!(RetryPolicy::new(0).decide(0), RetryDecision::GiveUp);
    }
}
