use anyhow::Result;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

pub mod schedule;

pub use schedule::{CycleStats, Schedule, run_schedule};

/// Single-threaded runtime plus the token that ends the posting loop.
pub struct PromoRuntime {
    runtime: Runtime,
    cancel: CancellationToken,
}

impl PromoRuntime {
    /// Build a current-thread Tokio runtime; every cycle runs on the calling thread.
    ///
    /// ```
    /// use promo_runtime::PromoRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = PromoRuntime::build("doctest-runtime").expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .thread_name(thread_name)
            .build()?;
        Ok(Self {
            runtime,
            cancel: CancellationToken::new(),
        })
    }

    /// Clone the shared cancellation token to coordinate shutdown.
    ///
    /// ```
    /// use promo_runtime::PromoRuntime;
    ///
    /// let runtime = PromoRuntime::build("cancel-example").unwrap();
    /// let cancel = runtime.cancellation();
    /// cancel.cancel();
    /// assert!(runtime.cancellation().is_cancelled());
    /// ```
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run a future to completion on the runtime.
    pub fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel outstanding work and shut the runtime down.
    pub fn shutdown(self, graceful: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

/// Cancel `cancel` on the first Ctrl-C. Must be called inside the runtime.
pub fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            res = tokio::signal::ctrl_c() => {
                match res {
                    Ok(()) => {
                        tracing::info!("Bot stopped by user");
                        cancel.cancel();
                    }
                    Err(e) => tracing::warn!(error = %e, "ctrl-c listener failed"),
                }
            }
        }
    });
}
