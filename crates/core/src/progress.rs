use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    Start { total: usize },
    Advance { completed: usize, total: usize, fraction: f32 },
    Finish { completed: usize, total: usize },
}

pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Counts finished cells across worker threads. Advance events reach the sink
/// in strictly increasing order even when workers finish out of order.
pub struct ProgressTracker {
    sink: Option<ProgressSink>,
    total: usize,
    completed: AtomicUsize,
    reported: Mutex<usize>,
}

impl ProgressTracker {
    pub fn new(total: usize, sink: Option<ProgressSink>) -> Self {
        if let Some(sink) = sink.as_ref() {
            (sink)(ProgressEvent::Start { total });
        }
        Self {
            sink,
            total,
            completed: AtomicUsize::new(0),
            reported: Mutex::new(0),
        }
    }

    pub fn advance(&self) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        let mut reported = match self.reported.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if completed <= *reported {
            return;
        }
        *reported = completed;
        let fraction = if self.total == 0 {
            1.0
        } else {
            (completed as f32 / self.total as f32).clamp(0.0, 1.0)
        };
        (sink)(ProgressEvent::Advance {
            completed,
            total: self.total,
            fraction,
        });
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn finish(&self) {
        if let Some(sink) = self.sink.as_ref() {
            (sink)(ProgressEvent::Finish {
                completed: self.completed(),
                total: self.total,
            });
        }
    }
}
