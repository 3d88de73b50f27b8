//! In-memory sinks that record everything into a shared journal
//!
//! Used by tests and dry runs to observe exactly what the dispatcher did and
//! in which order.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{ActuatorId, ActuatorSink, ContractError, DisplayKey, Frame, RenderSink};

/// One sink call, in the order the dispatcher made it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Shown { key: DisplayKey, seq: u64 },
    Pushed(ActuatorId),
    Released,
    Closed,
}

/// Shared, ordered record of sink calls
#[derive(Debug, Clone, Default)]
pub struct SinkJournal {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl SinkJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SinkEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: SinkEvent) {
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.lock().clone()
    }

    /// Sequence numbers shown on `key`, in order
    pub fn shown_on(&self, key: DisplayKey) -> Vec<u64> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Shown { key: k, seq } if *k == key => Some(*seq),
                _ => None,
            })
            .collect()
    }

    pub fn pushes(&self) -> Vec<ActuatorId> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Pushed(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &SinkEvent) -> usize {
        self.lock().iter().filter(|e| *e == event).count()
    }
}

/// Render sink recording into a journal
pub struct MemoryRenderSink {
    journal: SinkJournal,
}

impl MemoryRenderSink {
    pub fn new(journal: SinkJournal) -> Self {
        Self { journal }
    }
}

impl RenderSink for MemoryRenderSink {
    fn name(&self) -> &str {
        "memory"
    }

    fn show(&mut self, key: &DisplayKey, frame: &Frame) -> Result<(), ContractError> {
        self.journal.record(SinkEvent::Shown {
            key: *key,
            seq: frame.seq,
        });
        Ok(())
    }

    fn release(&mut self) -> Result<(), ContractError> {
        self.journal.record(SinkEvent::Released);
        Ok(())
    }
}

/// Actuator sink recording into a journal, optionally failing some ids
pub struct MemoryActuator {
    journal: SinkJournal,
    failing: BTreeSet<ActuatorId>,
}

impl MemoryActuator {
    pub fn new(journal: SinkJournal) -> Self {
        Self {
            journal,
            failing: BTreeSet::new(),
        }
    }

    /// Reject every push to `id`
    pub fn failing_on(mut self, id: ActuatorId) -> Self {
        self.failing.insert(id);
        self
    }
}

impl ActuatorSink for MemoryActuator {
    fn name(&self) -> &str {
        "memory"
    }

    fn push(&mut self, id: ActuatorId) -> Result<(), ContractError> {
        if self.failing.contains(&id) {
            return Err(ContractError::actuator("memory", format!("actuator {id} jammed")));
        }
        self.journal.record(SinkEvent::Pushed(id));
        Ok(())
    }

    fn close(&mut self) -> Result<(), ContractError> {
        self.journal.record(SinkEvent::Closed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourceId;

    #[test]
    fn test_journal_is_shared_and_ordered() {
        let journal = SinkJournal::new();
        let mut render = MemoryRenderSink::new(journal.clone());
        let mut actuator = MemoryActuator::new(journal.clone()).failing_on(9);
        let key = DisplayKey::live(SourceId::new(1));

        render.show(&key, &Frame::filled_rgb(4, 1, 1, [0, 0, 0])).unwrap();
        actuator.push(1).unwrap();
        assert!(actuator.push(9).is_err());
        render.release().unwrap();
        actuator.close().unwrap();

        assert_eq!(
            journal.events(),
            vec![
                SinkEvent::Shown { key, seq: 4 },
                SinkEvent::Pushed(1),
                SinkEvent::Released,
                SinkEvent::Closed,
            ]
        );
        assert_eq!(journal.shown_on(key), vec![4]);
        assert_eq!(journal.pushes(), vec![1]);
    }
}
