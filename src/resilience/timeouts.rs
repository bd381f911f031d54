//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap the upstream call with a per-request deadline
//! - Cancel the in-flight call cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use crate::proxy::error::ProxyError;

/// Run `fut` to completion or fail with [`ProxyError::UpstreamTimeout`].
///
/// Dropping the timed-out future drops the upstream connection with it.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, ProxyError>
where
    F: Future<Output = Result<T, ProxyError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(deadline = ?deadline, "Upstream deadline elapsed");
            Err(ProxyError::UpstreamTimeout(deadline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_results() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, ProxyError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn slow_future_times_out() {
        let result = with_deadline(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ProxyError>(())
        })
        .await;
        assert!(matches!(result, Err(ProxyError::UpstreamTimeout(d)) if d == Duration::from_millis(20)));
    }
}
