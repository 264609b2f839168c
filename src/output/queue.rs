// src/output/queue.rs

//! Line queues shared between a stream reader (producer) and the dispatcher
//! (consumer).
//!
//! Each queue couples its lines and its "has data" flag under one lock:
//! a push sets the flag in the same critical section as the enqueue, and a
//! drain clears it in the same critical section that empties the queue. The
//! flag can therefore never claim data that is not there, or hide data that
//! is.
//!
//! Both queues of an invocation share a [`Disposal`] flag. Once disposed, a
//! late push from a reader is dropped instead of signalling a dispatcher
//! that has already finished.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::output::StreamKind;

/// Shared "this invocation is finished" flag.
#[derive(Debug, Clone, Default)]
pub struct Disposal {
    disposed: Arc<Mutex<bool>>,
}

impl Disposal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispose(&self) {
        *lock(&self.disposed) = true;
    }
}

#[derive(Debug, Default)]
struct QueueState {
    lines: VecDeque<String>,
    ready: bool,
}

/// Unbounded, ordered queue of captured lines for one stream.
#[derive(Debug)]
pub struct OutputQueue {
    stream: StreamKind,
    state: Mutex<QueueState>,
    notify: Notify,
    disposal: Disposal,
}

impl OutputQueue {
    pub fn new(stream: StreamKind, disposal: Disposal) -> Self {
        Self {
            stream,
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            disposal,
        }
    }

    pub fn stream(&self) -> StreamKind {
        self.stream
    }

    /// Append a line and raise the readiness signal.
    ///
    /// Returns `false` (and drops the line) once the invocation has been
    /// disposed.
    pub fn push(&self, line: String) -> bool {
        let disposed = lock(&self.disposal.disposed);
        if *disposed {
            return false;
        }

        let mut state = lock(&self.state);
        state.lines.push_back(line);
        state.ready = true;
        self.notify.notify_one();
        true
    }

    /// Take every line currently queued, in arrival order, and clear the
    /// readiness signal before releasing the lock.
    pub fn drain(&self) -> Vec<String> {
        let mut state = lock(&self.state);
        let lines: Vec<String> = state.lines.drain(..).collect();
        state.ready = false;
        lines
    }

    pub fn has_data(&self) -> bool {
        lock(&self.state).ready
    }

    pub fn len(&self) -> usize {
        lock(&self.state).lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve once the queue has data.
    ///
    /// `notify_one` stores a permit when nobody is waiting, so a push that
    /// lands between the flag check and the await still wakes us. A stale
    /// permit left by an already-drained push just loops back to the check.
    pub async fn ready(&self) {
        loop {
            if self.has_data() {
                return;
            }
            self.notify.notified().await;
        }
    }
}

/// The stdout/stderr queue pair of one invocation.
#[derive(Debug, Clone)]
pub struct OutputQueues {
    pub stdout: Arc<OutputQueue>,
    pub stderr: Arc<OutputQueue>,
    disposal: Disposal,
}

impl OutputQueues {
    pub fn new() -> Self {
        let disposal = Disposal::new();
        Self {
            stdout: Arc::new(OutputQueue::new(StreamKind::Stdout, disposal.clone())),
            stderr: Arc::new(OutputQueue::new(StreamKind::Stderr, disposal.clone())),
            disposal,
        }
    }

    pub fn get(&self, stream: StreamKind) -> &Arc<OutputQueue> {
        match stream {
            StreamKind::Stdout => &self.stdout,
            StreamKind::Stderr => &self.stderr,
        }
    }

    /// Mark both queues disposed; later pushes become no-ops.
    pub fn dispose(&self) {
        self.disposal.dispose();
    }
}

impl Default for OutputQueues {
    fn default() -> Self {
        Self::new()
    }
}

// A panicking reader must not take the dispatcher down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn drain_returns_lines_in_order_and_clears_ready() {
        let queues = OutputQueues::new();
        let q = &queues.stdout;

        assert!(q.push("one".to_string()));
        assert!(q.push(String::new()));
        assert!(q.push("three".to_string()));
        assert!(q.has_data());

        assert_eq!(q.drain(), vec!["one".to_string(), String::new(), "three".to_string()]);
        assert!(!q.has_data());
        assert!(q.is_empty());
    }

    #[test]
    fn push_after_dispose_is_dropped() {
        let queues = OutputQueues::new();
        queues.stderr.push("before".to_string());
        queues.dispose();

        assert!(!queues.stderr.push("after".to_string()));
        assert!(!queues.stdout.push("after".to_string()));
        assert_eq!(queues.stderr.drain(), vec!["before".to_string()]);
        assert!(queues.stdout.is_empty());
    }

    #[tokio::test]
    async fn ready_wakes_on_push_from_another_task() {
        let queues = OutputQueues::new();
        let q = Arc::clone(&queues.stdout);

        let producer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            q.push("late".to_string());
        });

        tokio::time::timeout(Duration::from_secs(2), queues.stdout.ready())
            .await
            .expect("ready() should resolve after a push");
        producer.await.unwrap();
        assert_eq!(queues.stdout.drain(), vec!["late".to_string()]);
    }

    #[tokio::test]
    async fn stale_permit_does_not_report_ready() {
        let queues = OutputQueues::new();
        queues.stdout.push("x".to_string());
        queues.stdout.drain();

        let waited =
            tokio::time::timeout(Duration::from_millis(50), queues.stdout.ready()).await;
        assert!(waited.is_err(), "drained queue must not look ready");
    }
}
