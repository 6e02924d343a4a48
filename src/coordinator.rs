use crate::buffer::LogBuffer;
use crate::error::ShipError;
use crate::transport::{LogPayload, LogTransport};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Result of one flush cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Buffer was empty; the transport was not called.
    Idle,
    /// The batch of this many entries was acknowledged and discarded.
    Delivered(usize),
    /// Delivery failed and this many entries went back to the buffer head.
    Requeued(usize),
}

/// Where the coordinator currently is in a flush cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FlushState {
    Idle = 0,
    Draining = 1,
    Shipping = 2,
}

impl FlushState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => FlushState::Draining,
            2 => FlushState::Shipping,
            _ => FlushState::Idle,
        }
    }
}

/// Counters updated by the coordinator task.
#[derive(Debug, Default)]
pub struct FlushCounters {
    /// Entries acknowledged by the transport.
    pub delivered: AtomicU64,
    /// Entries put back into the buffer after a failed attempt.
    pub requeued: AtomicU64,
    /// Shipping attempts that failed.
    pub failed_attempts: AtomicU64,
}

#[derive(Debug)]
enum Command {
    Flush(oneshot::Sender<FlushOutcome>),
    Shutdown(oneshot::Sender<FlushOutcome>),
}

struct Shared {
    wake: Notify,
    state: AtomicU8,
    counters: FlushCounters,
}

impl Shared {
    fn set_state(&self, state: FlushState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Owns the single task that drains the buffer and ships batches.
///
/// Every shipping attempt runs on that one task, so at most one batch is
/// in flight. Size-triggered and timer-triggered wake-ups go through a
/// [`Notify`] and coalesce into a single pending attempt when they arrive
/// while a batch is still being shipped. Explicit flushes and shutdown are
/// sent as commands so callers can await their outcome.
pub struct FlushCoordinator {
    runtime: tokio::runtime::Handle,
    buffer: Arc<LogBuffer>,
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl FlushCoordinator {
    /// Spawn the coordinator task on the current Tokio runtime.
    ///
    /// **Parameters**
    /// - `buffer`: the shared [`LogBuffer`] producers append to.
    /// - `transport`: capability used to deliver each batch.
    /// - `source`: identifier placed in every payload.
    ///
    /// **Returns**
    /// - `Err(ShipError::Runtime)` when called outside a Tokio runtime.
    pub fn spawn(
        buffer: Arc<LogBuffer>,
        transport: Arc<dyn LogTransport>,
        source: impl Into<String>,
    ) -> Result<Self, ShipError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| ShipError::Runtime(e.to_string()))?;

        let shared = Arc::new(Shared {
            wake: Notify::new(),
            state: AtomicU8::new(FlushState::Idle as u8),
            counters: FlushCounters::default(),
        });
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = Worker {
            buffer: Arc::clone(&buffer),
            shared: Arc::clone(&shared),
            transport,
            source: source.into(),
        };
        let handle = runtime.spawn(worker.run(rx));

        Ok(Self {
            runtime,
            buffer,
            shared,
            commands: tx,
            worker: Mutex::new(Some(handle)),
            ticker: Mutex::new(None),
        })
    }

    /// Wake the coordinator without waiting for the result.
    ///
    /// Cheap and non-blocking; safe to call from any thread.
    pub fn trigger(&self) {
        self.shared.wake.notify_one();
    }

    /// Run one flush cycle and wait for its outcome.
    ///
    /// Returns [`ShipError::Closed`] once the coordinator has shut down.
    pub async fn request_flush(&self) -> Result<FlushOutcome, ShipError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Flush(tx))
            .map_err(|_| ShipError::Closed)?;
        rx.await.map_err(|_| ShipError::Closed)
    }

    /// Like [`request_flush`](Self::request_flush) but a closed coordinator
    /// simply reports [`FlushOutcome::Idle`].
    pub async fn flush_now(&self) -> FlushOutcome {
        self.request_flush().await.unwrap_or(FlushOutcome::Idle)
    }

    /// Start the recurring auto-flush timer, replacing any running one.
    ///
    /// On each tick the coordinator is woken if the buffer holds entries.
    /// The first tick fires one full `interval` after the call. Does nothing
    /// once the coordinator has shut down.
    pub fn start_auto_flush(&self, interval: Duration) {
        self.stop_auto_flush();
        if self.commands.is_closed() || lock(&self.worker).is_none() {
            return;
        }

        let buffer = Arc::clone(&self.buffer);
        let shared = Arc::clone(&self.shared);
        let handle = self.runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + interval, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if !buffer.is_empty() {
                    shared.wake.notify_one();
                }
            }
        });

        *lock(&self.ticker) = Some(handle);
    }

    /// Cancel the auto-flush timer. Does not flush; calling it again is a
    /// no-op.
    pub fn stop_auto_flush(&self) {
        if let Some(handle) = lock(&self.ticker).take() {
            handle.abort();
        }
    }

    pub fn auto_flush_running(&self) -> bool {
        lock(&self.ticker).is_some()
    }

    /// Stop the timer, run a final flush and wait for the coordinator task
    /// to finish.
    ///
    /// Only the first call does any work; later calls return
    /// [`FlushOutcome::Idle`].
    pub async fn shutdown(&self) -> FlushOutcome {
        self.stop_auto_flush();

        let (tx, rx) = oneshot::channel();
        let outcome = match self.commands.send(Command::Shutdown(tx)) {
            Ok(()) => rx.await.unwrap_or(FlushOutcome::Idle),
            Err(_) => FlushOutcome::Idle,
        };

        let worker = lock(&self.worker).take();
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                warn!(error = %e, "flush coordinator task ended abnormally");
            }
        }
        outcome
    }

    pub fn state(&self) -> FlushState {
        FlushState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    pub fn counters(&self) -> &FlushCounters {
        &self.shared.counters
    }
}

impl Drop for FlushCoordinator {
    fn drop(&mut self) {
        // Dropping `commands` lets the worker run one last flush and exit.
        self.stop_auto_flush();
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Worker {
    buffer: Arc<LogBuffer>,
    shared: Arc<Shared>,
    transport: Arc<dyn LogTransport>,
    source: String,
}

impl Worker {
    async fn run(self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                biased;
                cmd = commands.recv() => match cmd {
                    Some(Command::Flush(ack)) => {
                        let outcome = self.flush_once().await;
                        let _ = ack.send(outcome);
                    }
                    Some(Command::Shutdown(ack)) => {
                        let outcome = self.flush_once().await;
                        let _ = ack.send(outcome);
                        break;
                    }
                    None => {
                        self.flush_once().await;
                        break;
                    }
                },
                _ = self.shared.wake.notified() => {
                    self.flush_once().await;
                }
            }
        }
        debug!(buffered = self.buffer.len(), "flush coordinator stopped");
    }

    async fn flush_once(&self) -> FlushOutcome {
        self.shared.set_state(FlushState::Draining);
        let batch = self.buffer.drain_all();
        if batch.is_empty() {
            self.shared.set_state(FlushState::Idle);
            return FlushOutcome::Idle;
        }

        let count = batch.len();
        self.shared.set_state(FlushState::Shipping);
        let payload = Arc::new(LogPayload::new(self.source.clone(), batch));

        // The send runs on its own task so a panicking transport surfaces as
        // a `JoinError` here instead of taking the worker and the batch with
        // it. Awaiting it in place keeps a single batch in flight.
        let transport = Arc::clone(&self.transport);
        let in_flight = Arc::clone(&payload);
        let result = tokio::spawn(async move { transport.send(&in_flight).await })
            .await
            .unwrap_or_else(|e| Err(ShipError::Other(format!("transport task failed: {e}"))));

        let counters = &self.shared.counters;
        let outcome = match result {
            Ok(()) => {
                counters.delivered.fetch_add(count as u64, Ordering::Relaxed);
                debug!(count, "log batch delivered");
                FlushOutcome::Delivered(count)
            }
            Err(e) => {
                counters.failed_attempts.fetch_add(1, Ordering::Relaxed);
                counters.requeued.fetch_add(count as u64, Ordering::Relaxed);
                warn!(error = %e, count, "failed to ship log batch, requeueing");
                let entries = Arc::try_unwrap(payload)
                    .map(LogPayload::into_entries)
                    .unwrap_or_else(|shared| shared.logs.clone());
                self.buffer.requeue_front(entries);
                FlushOutcome::Requeued(count)
            }
        };

        self.shared.set_state(FlushState::Idle);
        outcome
    }
}
