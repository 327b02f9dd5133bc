//! Change notifications emitted after each structural mutation of a design.

use crossbeam::channel::{unbounded, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesignEvent {
    ComponentAdded { name: String },
    ComponentRemoved { name: String },
    ComponentRenamed { old: String, new: String },
    ComponentsCleared,
    ComponentsRebuilt { good: usize, failed: usize },
    ConnectorAdded { name: String },
    ConnectorsCleared,
    VariablesChanged,
    ChipsChanged,
    Reset,
}

impl DesignEvent {
    /// Whether the set or order of components changed.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DesignEvent::ComponentAdded { .. }
                | DesignEvent::ComponentRemoved { .. }
                | DesignEvent::ComponentRenamed { .. }
                | DesignEvent::ComponentsCleared
                | DesignEvent::Reset
        )
    }
}

/// Fan-out of [`DesignEvent`]s to any number of subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<DesignEvent>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<DesignEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Sends `event` to every live subscriber and drops the disconnected ones.
    pub fn emit(&mut self, event: DesignEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_events() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.emit(DesignEvent::ComponentsCleared);

        assert_eq!(a.try_recv(), Ok(DesignEvent::ComponentsCleared));
        assert_eq!(b.try_recv(), Ok(DesignEvent::ComponentsCleared));
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut bus = EventBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(DesignEvent::VariablesChanged);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(keep.try_recv(), Ok(DesignEvent::VariablesChanged));
    }
}
