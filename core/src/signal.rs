use std::sync::Arc;

use tokio::sync::watch;

/// Single-value publish/subscribe cell: one current value, replayed to late
/// subscribers, updated manually by whoever owns the producer side. Replaces
/// the ambient reactive subjects earlier revisions kept in globals.
#[derive(Debug, Clone)]
pub struct Signal<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T: Clone> Signal<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Receiver that starts at the current value and observes later sets.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_current_value_to_late_subscribers() {
        let signal = Signal::new(vec![1u32]);
        signal.set(vec![1, 2, 3]);

        let rx = signal.subscribe();
        assert_eq!(*rx.borrow(), vec![1, 2, 3]);
        assert_eq!(signal.get(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn subscribers_observe_later_sets() {
        let signal = Signal::new(0u32);
        let mut rx = signal.subscribe();

        signal.set(7);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 7);
    }
}
