//! # Event Queue
//!
//! Shared coordination primitives between the sensor workers and the dispatcher.
//!
//! - [`EventQueue`]: unbounded multi-producer / single-consumer FIFO with
//!   blocking-with-timeout dequeue
//! - [`StopSignal`]: process-wide cooperative stop flag
//! - [`AbortFlag`]: externally-driven quit request (Ctrl-C, quit key, timeout)
//!
//! ## Usage Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use contracts::{Event, SourceId};
//! use event_queue::{Dequeued, EventQueue, StopSignal};
//!
//! let queue = Arc::new(EventQueue::new());
//! let stop = StopSignal::new();
//!
//! queue.enqueue(Event::source_finished(SourceId::new(1)));
//! match queue.dequeue(Duration::from_millis(10)) {
//!     Dequeued::Event(event) => assert_eq!(event.source(), Some(SourceId::new(1))),
//!     Dequeued::TimedOut => unreachable!(),
//! }
//!
//! assert!(stop.request());
//! assert!(!stop.request());
//! assert!(stop.is_set());
//! ```

mod queue;
mod signal;

pub use queue::{Dequeued, EventQueue};
pub use signal::{AbortFlag, StopSignal};
