//! Timeout, bounded retry and exponential backoff around a [`Classify`] call.

use std::time::Duration;

use shif_core::config::ClassifierPolicy;
use tracing::{debug, warn};

use crate::classifier::{Classify, ClassifierFields, ClassifyError};

/// Longest single backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt - 1)`.
pub fn backoff_delay(policy: &ClassifierPolicy, attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(16);
    Duration::from_millis(policy.backoff_base_ms.saturating_mul(factor)).min(MAX_BACKOFF)
}

/// Call the classifier with a per-attempt timeout, retrying transient
/// failures up to `policy.max_retries` times.
///
/// Permanent failures and unparseable answers return immediately. Running out
/// of retries yields [`ClassifyError::RetriesExhausted`].
pub async fn classify_with_retry(
    classifier: &dyn Classify,
    text: &str,
    policy: &ClassifierPolicy,
) -> Result<ClassifierFields, ClassifyError> {
    let timeout = Duration::from_millis(policy.timeout_ms);
    let mut last_error = String::new();

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let backoff = backoff_delay(policy, attempt);
            warn!(
                classifier = classifier.name(),
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                "retrying classifier after backoff"
            );
            tokio::time::sleep(backoff).await;
        }

        let result = match tokio::time::timeout(timeout, classifier.classify(text)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifyError::Timeout(timeout)),
        };

        match result {
            Ok(fields) => {
                debug!(classifier = classifier.name(), attempt, "classifier answered");
                return Ok(fields);
            }
            Err(e) if e.is_transient() => {
                last_error = e.to_string();
            }
            Err(e) => return Err(e),
        }
    }

    Err(ClassifyError::RetriesExhausted {
        attempts: policy.max_retries + 1,
        last_error,
    })
}
