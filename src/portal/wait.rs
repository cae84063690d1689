use crate::error::Result;
use std::future::Future;
use tokio::time::{self, sleep, Duration};

/// Polls `probe` every `interval` until it yields a value or `timeout` elapses.
///
/// The whole loop runs under one deadline, so a probe stuck inside a slow
/// browser command is cut off as well. Errors from the probe end the wait
/// immediately.
///
/// # Returns
///
/// * `Ok(Some(value))` - the probe produced a value in time
/// * `Ok(None)` - the deadline passed first
/// * `Err` - the probe failed
pub async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut probe: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let polling = async {
        loop {
            match probe().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => sleep(interval).await,
                Err(err) => return Err(err),
            }
        }
    };

    match time::timeout(timeout, polling).await {
        Ok(result) => result.map(Some),
        Err(_) => Ok(None),
    }
}
