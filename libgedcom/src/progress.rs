//! Progress notification and cooperative cancellation.
//!
//! Observers are polled between lines while the tree is built and between
//! root-level records while the graph is loaded. Any observer returning
//! [`ControlFlow::Break`] stops the load at that boundary with
//! [`GedcomError::Cancelled`].

use std::ops::ControlFlow;

use crate::error::{GedcomError, Phase, Result};

/// One progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: Phase,
    /// Lines read or records loaded so far.
    pub count: usize,
    /// Set on the final event of a phase.
    pub complete: bool,
}

/// Receives progress events and may request cancellation.
pub trait ProgressObserver {
    fn notify(&mut self, event: &ProgressEvent) -> ControlFlow<()>;
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressEvent) -> ControlFlow<()>,
{
    fn notify(&mut self, event: &ProgressEvent) -> ControlFlow<()> {
        self(event)
    }
}

/// Fans events out to the registered observers at a fixed rate.
pub(crate) struct Progress<'a> {
    observers: &'a mut [Box<dyn ProgressObserver>],
    rate: usize,
}

impl<'a> Progress<'a> {
    pub fn new(observers: &'a mut [Box<dyn ProgressObserver>], rate: usize) -> Self {
        Self { observers, rate }
    }

    /// Notify if `count` falls on the notification rate.
    pub fn tick(&mut self, phase: Phase, count: usize) -> Result<()> {
        if self.rate > 0 && count > 0 && count % self.rate == 0 {
            self.emit(phase, count, false)
        } else {
            Ok(())
        }
    }

    /// Notify that a phase has completed.
    pub fn finish(&mut self, phase: Phase, count: usize) -> Result<()> {
        self.emit(phase, count, true)
    }

    fn emit(&mut self, phase: Phase, count: usize, complete: bool) -> Result<()> {
        let event = ProgressEvent {
            phase,
            count,
            complete,
        };
        let mut cancelled = false;
        for observer in self.observers.iter_mut() {
            if observer.notify(&event).is_break() {
                cancelled = true;
            }
        }
        if cancelled {
            tracing::debug!(%phase, count, "load cancelled by observer");
            return Err(GedcomError::Cancelled { phase, count });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_tick_respects_rate() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut observers: Vec<Box<dyn ProgressObserver>> =
            vec![Box::new(move |e: &ProgressEvent| {
                sink.borrow_mut().push(e.count);
                ControlFlow::Continue(())
            })];
        let mut progress = Progress::new(&mut observers, 2);
        for n in 1..=5 {
            progress.tick(Phase::Reading, n).unwrap();
        }
        progress.finish(Phase::Reading, 5).unwrap();
        assert_eq!(*seen.borrow(), vec![2, 4, 5]);
    }

    #[test]
    fn test_break_cancels() {
        let mut observers: Vec<Box<dyn ProgressObserver>> =
            vec![Box::new(|_: &ProgressEvent| ControlFlow::Break(()))];
        let mut progress = Progress::new(&mut observers, 1);
        let err = progress.tick(Phase::Loading, 1).unwrap_err();
        assert!(matches!(
            err,
            GedcomError::Cancelled {
                phase: Phase::Loading,
                count: 1
            }
        ));
    }
}
