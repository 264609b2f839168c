// src/exec/dispatcher.rs

//! The notification loop.
//!
//! One `select!` waits on five signals and, when several are ready at once,
//! takes them in this order:
//!
//! 1. timeout expired
//! 2. cancellation requested
//! 3. stderr has data
//! 4. stdout has data
//! 5. process exited
//!
//! Termination comes first so a chatty, hung tool cannot postpone its own
//! kill. Exit comes last, and is followed by a wait for both readers to hit
//! end of stream and a final drain, so output written before the exit is
//! always logged before the verdict.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::exec::process::{KillOutcome, ProcessHandle};
use crate::output::queue::{OutputQueue, OutputQueues};
use crate::output::router::LineRouter;
use crate::types::Termination;

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The tool exited on its own and all of its output was drained.
    Exited,
    /// The tool was killed.
    Terminated { reason: Termination, kill: KillOutcome },
}

enum Signal {
    TimedOut,
    Cancelled,
    StderrReady,
    StdoutReady,
    Exited(io::Result<ExitStatus>),
}

pub struct Dispatcher<'q> {
    queues: &'q OutputQueues,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    drain_window: Duration,
}

impl<'q> Dispatcher<'q> {
    /// `drain_window` bounds the wait for end-of-stream after the process
    /// exits.
    pub fn new(
        queues: &'q OutputQueues,
        timeout: Option<Duration>,
        cancel: CancellationToken,
        drain_window: Duration,
    ) -> Self {
        Self {
            queues,
            timeout,
            cancel,
            drain_window,
        }
    }

    /// Drive `process` to completion, routing output through `router`.
    pub async fn run(
        &self,
        process: &mut ProcessHandle,
        router: &mut LineRouter<'_>,
    ) -> DispatchOutcome {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let timer = expire_at(deadline);
        tokio::pin!(timer);

        loop {
            let signal = tokio::select! {
                biased;
                _ = &mut timer => Signal::TimedOut,
                _ = self.cancel.cancelled() => Signal::Cancelled,
                _ = self.queues.stderr.ready() => Signal::StderrReady,
                _ = self.queues.stdout.ready() => Signal::StdoutReady,
                status = process.wait() => Signal::Exited(status),
            };

            match signal {
                Signal::TimedOut => {
                    return self.terminate(process, router, Termination::TimedOut).await;
                }
                Signal::Cancelled => {
                    return self.terminate(process, router, Termination::Cancelled).await;
                }
                Signal::StderrReady => {
                    drain(&self.queues.stderr, router);
                    // Keep stdout moving while stderr is busy.
                    drain(&self.queues.stdout, router);
                }
                Signal::StdoutReady => drain(&self.queues.stdout, router),
                Signal::Exited(status) => {
                    match status {
                        Ok(status) => debug!(pid = ?process.pid(), %status, "tool process exited"),
                        Err(e) => warn!(pid = ?process.pid(), error = %e, "waiting for tool process failed"),
                    }

                    if !process.join_readers(self.drain_window).await {
                        debug!(
                            pid = ?process.pid(),
                            "output streams still open after exit; draining what arrived"
                        );
                    }
                    drain(&self.queues.stderr, router);
                    drain(&self.queues.stdout, router);
                    return DispatchOutcome::Exited;
                }
            }
        }
    }

    async fn terminate(
        &self,
        process: &mut ProcessHandle,
        router: &mut LineRouter<'_>,
        reason: Termination,
    ) -> DispatchOutcome {
        debug!(pid = ?process.pid(), %reason, "terminating tool process");
        let kill = process.terminate().await;

        // Readers are stopped by now; log whatever they had already queued.
        drain(&self.queues.stderr, router);
        drain(&self.queues.stdout, router);

        DispatchOutcome::Terminated { reason, kill }
    }
}

fn drain(queue: &OutputQueue, router: &mut LineRouter<'_>) {
    let stream = queue.stream();
    for line in queue.drain() {
        router.route(stream, line);
    }
}

async fn expire_at(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
