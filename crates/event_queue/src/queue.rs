//! EventQueue - unbounded MPSC FIFO shared by workers and dispatcher

use std::time::{Duration, Instant};

use contracts::Event;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use observability::{record_dequeue_timeout, record_event_enqueued, record_queue_latency_ms};
use tracing::{error, trace};

/// Event plus the instant it entered the queue
#[derive(Debug)]
struct Queued {
    event: Event,
    enqueued_at: Instant,
}

/// Outcome of a bounded dequeue
#[derive(Debug)]
pub enum Dequeued {
    /// Next event in FIFO order
    Event(Event),
    /// Nothing arrived within the timeout. A normal poll outcome, not an error.
    TimedOut,
}

impl Dequeued {
    pub fn into_event(self) -> Option<Event> {
        match self {
            Self::Event(event) => Some(event),
            Self::TimedOut => None,
        }
    }
}

/// Thread-safe unbounded FIFO of [`Event`]s
///
/// Created once, shared by `Arc` between all producers and the single
/// consumer. Delivery order is enqueue order as observed by the channel;
/// events from one producer thread are therefore delivered in the order
/// that thread enqueued them.
#[derive(Debug)]
pub struct EventQueue {
    tx: Sender<Queued>,
    rx: Receiver<Queued>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Append an event. Never blocks.
    pub fn enqueue(&self, event: Event) {
        let kind = event.kind();
        let source = event.source();

        // The queue owns a receiver, so the channel cannot be disconnected while `self` lives.
        if let Err(e) = self.tx.send(Queued {
            event,
            enqueued_at: Instant::now(),
        }) {
            error!(kind = %e.0.event.kind(), "event queue disconnected, event lost");
            return;
        }

        record_event_enqueued(source, kind);
        trace!(kind = %kind, source = ?source, "event enqueued");
    }

    /// Block until an event is available or `timeout` elapses
    pub fn dequeue(&self, timeout: Duration) -> Dequeued {
        match self.rx.recv_timeout(timeout) {
            Ok(queued) => Dequeued::Event(Self::unwrap_queued(queued)),
            Err(RecvTimeoutError::Timeout) => {
                record_dequeue_timeout();
                Dequeued::TimedOut
            }
            // Unreachable while we hold a sender; treat like an empty poll.
            Err(RecvTimeoutError::Disconnected) => Dequeued::TimedOut,
        }
    }

    /// Non-blocking dequeue
    pub fn try_dequeue(&self) -> Option<Event> {
        self.rx.try_recv().ok().map(Self::unwrap_queued)
    }

    /// Events currently waiting
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    fn unwrap_queued(queued: Queued) -> Event {
        record_queue_latency_ms(queued.enqueued_at.elapsed().as_secs_f64() * 1000.0);
        queued.event
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
