use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

use crate::entities::upload::ProgressSnapshot;

type Observer = Box<dyn Fn(&ProgressSnapshot) + Send + Sync>;

/// Counts settled uploads out of a fixed total.
///
/// Settlements may arrive in any order from concurrent tasks; published snapshots only move forward.
pub struct ProgressAggregator {
    total: usize,
    completed: AtomicUsize,
    sender: watch::Sender<ProgressSnapshot>,
    observer: Option<Observer>,
}

impl ProgressAggregator {
    pub fn new(total: usize) -> Self {
        let (sender, _) = watch::channel(ProgressSnapshot::new(0, total));
        ProgressAggregator {
            total,
            completed: AtomicUsize::new(0),
            sender,
            observer: None,
        }
    }

    /// Like `new`, calling `observer` with every published snapshot.
    pub fn with_observer<F>(total: usize, observer: F) -> Self
    where
        F: Fn(&ProgressSnapshot) + Send + Sync + 'static,
    {
        ProgressAggregator {
            observer: Some(Box::new(observer)),
            ..Self::new(total)
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Marks one task as settled, success or failure alike. Extra calls past `total` are ignored.
    pub fn record_settlement(&self) -> ProgressSnapshot {
        let total = self.total;
        let completed = match self
            .completed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < total).then_some(n + 1))
        {
            Ok(previous) => previous + 1,
            Err(current) => current,
        };

        let snapshot = ProgressSnapshot::new(completed, total);
        self.sender.send_if_modified(|current| {
            if snapshot.completed <= current.completed {
                return false;
            }
            *current = snapshot.clone();
            if let Some(observer) = &self.observer {
                observer(current);
            }
            true
        });

        snapshot
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.sender.subscribe()
    }

    pub fn is_complete(&self) -> bool {
        self.completed.load(Ordering::Acquire) >= self.total
    }
}
