use std::future::Future;
use std::time::{Duration, Instant};

use tracing::warn;

use super::error::SignalError;
use super::types::{SignalKind, SignalResult};

/// Bounds `fut` by `timeout` and stamps the elapsed time on the result.
///
/// A producer that overruns degrades to an unavailable result; it never blocks the
/// ensemble past its budget.
pub async fn bounded<F>(kind: SignalKind, timeout: Duration, fut: F) -> SignalResult
where
    F: Future<Output = SignalResult>,
{
    let start = Instant::now();
    let result = match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            warn!(signal = %kind, timeout_ms, "Signal producer timed out");
            SignalError::Timeout { kind, timeout_ms }.into_result(kind)
        }
    };

    result.with_latency(elapsed_ms(start))
}

#[inline]
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
