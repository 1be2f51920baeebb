//! Fixed-rate batch scheduler
//!
//! Partitions work into consecutive fixed-size groups, runs each group
//! concurrently, and pauses between groups as a throttle against remote
//! rate limiting. Failed items are retried with linear backoff; one
//! item's failure never cancels its siblings, and the result order
//! always matches the input order.

use futures::future::join_all;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Scheduling knobs; defaults match the remote API's observed tolerance.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Items processed concurrently per group
    pub batch_size: usize,
    /// Pause between groups (not after the last)
    pub inter_batch_delay: Duration,
    /// Additional attempts per failed item
    pub max_retries: u32,
    /// Backoff base; attempt N waits N * base before retrying
    pub retry_base_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 5,
            inter_batch_delay: Duration::from_millis(2000),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
        }
    }
}

/// Run `worker` over `items` in fixed-size concurrent batches.
///
/// The returned vector has one entry per input item, in input order.
/// An `Err` entry carries the last failure after retries were
/// exhausted; the run itself always completes.
pub async fn run_batches<T, W, Fut, R, E>(
    items: Vec<T>,
    worker: W,
    opts: &BatchOptions,
) -> Vec<Result<R, E>>
where
    T: Clone,
    W: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: Display,
{
    let batch_size = opts.batch_size.max(1);
    let total = items.len();
    let total_batches = total.div_ceil(batch_size);
    let mut results = Vec::with_capacity(total);

    let mut remaining = items;
    let mut batch_no = 0usize;

    while !remaining.is_empty() {
        if batch_no > 0 {
            sleep(opts.inter_batch_delay).await;
        }
        batch_no += 1;

        let rest = remaining.split_off(batch_size.min(remaining.len()));
        let batch = std::mem::replace(&mut remaining, rest);

        debug!(
            batch = batch_no,
            total_batches,
            size = batch.len(),
            "running batch"
        );

        let settled = join_all(
            batch
                .into_iter()
                .map(|item| run_with_retry(item, &worker, opts)),
        )
        .await;

        results.extend(settled);
    }

    results
}

async fn run_with_retry<T, W, Fut, R, E>(item: T, worker: &W, opts: &BatchOptions) -> Result<R, E>
where
    T: Clone,
    W: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match worker(item.clone()).await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt, "item succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                if attempt > opts.max_retries {
                    warn!(attempt, error = %error, "item failed, retries exhausted");
                    return Err(error);
                }

                warn!(attempt, error = %error, "item failed, retrying");
                sleep(opts.retry_base_delay * attempt).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    fn fast_opts(batch_size: usize, max_retries: u32) -> BatchOptions {
        BatchOptions {
            batch_size,
            inter_batch_delay: Duration::from_millis(5),
            max_retries,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn preserves_input_order() {
        let items: Vec<u32> = (0..10).collect();
        let opts = fast_opts(3, 0);

        // later items finish first within a batch
        let results = run_batches(
            items.clone(),
            |n: u32| async move {
                sleep(Duration::from_millis(u64::from(10 - n))).await;
                Ok::<u32, String>(n)
            },
            &opts,
        )
        .await;

        let unwrapped: Vec<u32> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(unwrapped, items);
    }

    #[tokio::test]
    async fn at_most_batch_size_in_flight() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let opts = fast_opts(3, 0);

        let results = {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            let calls = calls.clone();

            run_batches(
                (0..7).collect::<Vec<u32>>(),
                move |_n| {
                    let in_flight = in_flight.clone();
                    let peak = peak.clone();
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        sleep(Duration::from_millis(10)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok::<(), String>(())
                    }
                },
                &opts,
            )
            .await
        };

        assert_eq!(results.len(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 7);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn retries_then_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let opts = fast_opts(2, 3);

        let results = {
            let calls = calls.clone();
            run_batches(
                vec![()],
                move |_| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err::<(), String>("boom".to_string())
                    }
                },
                &opts,
            )
            .await
        };

        assert_eq!(calls.load(Ordering::SeqCst), 1 + opts.max_retries);
        assert_eq!(results[0].as_ref().unwrap_err(), "boom");
    }

    #[tokio::test]
    async fn failure_does_not_cancel_siblings() {
        let opts = fast_opts(3, 0);

        let results = run_batches(
            (0..6).collect::<Vec<u32>>(),
            |n: u32| async move {
                if n % 2 == 0 {
                    Err(format!("item {} failed", n))
                } else {
                    Ok(n)
                }
            },
            &opts,
        )
        .await;

        assert_eq!(results.len(), 6);
        for (n, result) in results.iter().enumerate() {
            assert_eq!(result.is_err(), n % 2 == 0);
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let opts = fast_opts(1, 3);

        let results = {
            let calls = calls.clone();
            run_batches(
                vec![()],
                move |_| {
                    let calls = calls.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err("transient".to_string())
                        } else {
                            Ok::<&str, String>("done")
                        }
                    }
                },
                &opts,
            )
            .await
        };

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*results[0].as_ref().unwrap(), "done");
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let opts = fast_opts(3, 1);
        let results =
            run_batches(Vec::<u32>::new(), |n: u32| async move { Ok::<u32, String>(n) }, &opts)
                .await;
        assert!(results.is_empty());
    }
}
