use anyhow::Result;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Delays between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// After a cycle that completed, successfully or not.
    pub interval: Duration,
    /// After a cycle that errored or panicked.
    pub retry_delay: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2 * 60 * 60),
            retry_delay: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub succeeded: u64,
    pub failed: u64,
    pub unexpected: u64,
}

/// Run `cycle` until `cancel` fires.
///
/// `Ok(true)` and `Ok(false)` are ordinary outcomes and wait the full
/// interval. An `Err` or a panic escaping the cycle waits `retry_delay`
/// instead. Cancellation is checked before each cycle and ends any sleep
/// at once; a running cycle is never interrupted.
pub async fn run_schedule<F, Fut>(
    mut cycle: F,
    schedule: Schedule,
    cancel: CancellationToken,
) -> CycleStats
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut stats = CycleStats::default();
    tracing::info!(
        "Bot will tweet every {}. Press Ctrl+C to stop.",
        describe(schedule.interval)
    );

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let retrying = match AssertUnwindSafe(cycle()).catch_unwind().await {
            Ok(Ok(true)) => {
                stats.succeeded += 1;
                false
            }
            Ok(Ok(false)) => {
                stats.failed += 1;
                false
            }
            Ok(Err(e)) => {
                stats.unexpected += 1;
                tracing::error!("Unexpected error: {e:#}");
                true
            }
            Err(panic) => {
                stats.unexpected += 1;
                tracing::error!("Unexpected error: cycle panicked: {}", panic_message(&*panic));
                true
            }
        };

        if cancel.is_cancelled() {
            break;
        }
        let delay = if retrying {
            tracing::info!("Waiting {} before retrying...", describe(schedule.retry_delay));
            schedule.retry_delay
        } else {
            tracing::info!("Sleeping for {}...", describe(schedule.interval));
            schedule.interval
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    tracing::info!(
        succeeded = stats.succeeded,
        failed = stats.failed,
        unexpected = stats.unexpected,
        "schedule.stopped"
    );
    stats
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// "2 hours", "5 minutes", "90 seconds".
fn describe(d: Duration) -> String {
    let secs = d.as_secs();
    let (n, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn schedule() -> Schedule {
        Schedule::default()
    }

    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_secs(1),
            "elapsed {elapsed:?}, expected {expected:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_runs_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let stats = run_schedule(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Ok(true) }
            },
            schedule(),
            cancel,
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(stats, CycleStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn ordinary_outcomes_wait_the_full_interval() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (c, stop) = (calls.clone(), cancel.clone());
        let start = Instant::now();

        let stats = run_schedule(
            move || {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                let stop = stop.clone();
                async move {
                    if n == 3 {
                        stop.cancel();
                    }
                    Ok(n != 2)
                }
            },
            schedule(),
            cancel,
        )
        .await;

        assert_eq!(
            stats,
            CycleStats {
                succeeded: 2,
                failed: 1,
                unexpected: 0
            }
        );
        assert_elapsed(start, Duration::from_secs(2 * 7200));
    }

    #[tokio::test(start_paused = true)]
    async fn errors_and_panics_use_the_short_retry_delay() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (c, stop) = (calls.clone(), cancel.clone());
        let start = Instant::now();

        let stats = run_schedule(
            move || {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                let stop = stop.clone();
                async move {
                    match n {
                        1 => Err(anyhow!("signing failed")),
                        2 => panic!("boom"),
                        _ => {
                            stop.cancel();
                            Ok(true)
                        }
                    }
                }
            },
            schedule(),
            cancel,
        )
        .await;

        assert_eq!(stats.unexpected, 2);
        assert_eq!(stats.succeeded, 1);
        assert_elapsed(start, Duration::from_secs(2 * 300));
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_ends_the_sleep_immediately() {
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(600)).await;
            stop.cancel();
        });
        let start = Instant::now();

        let stats = run_schedule(|| async { Ok(true) }, schedule(), cancel).await;

        assert_eq!(stats.succeeded, 1);
        assert_elapsed(start, Duration::from_secs(600));
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(describe(Duration::from_secs(7200)), "2 hours");
        assert_eq!(describe(Duration::from_secs(300)), "5 minutes");
        assert_eq!(describe(Duration::from_secs(3600)), "1 hour");
        assert_eq!(describe(Duration::from_secs(90)), "90 seconds");
    }

    #[test]
    fn panic_payloads_are_rendered() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "non-string panic payload");
    }
}
