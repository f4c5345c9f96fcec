//! Nesting depth guard
//!
//! [`DepthCounter::enter`] is called on entry to every composite and returns
//! a [`DepthGuard`] that decrements the counter when dropped, so early
//! returns through `?` cannot leak depth. The guard shares the counter
//! through an `Rc` and holds no borrow of the traversal context.

use crate::ber::reader::NestingLimit;
use ber_core::{BerError, BerResult};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct DepthState {
    current: Cell<usize>,
    peak: Cell<usize>,
}

/// Depth counter for one call
#[derive(Debug, Clone, Default)]
pub struct DepthCounter {
    state: Rc<DepthState>,
    max: Option<usize>,
}

impl DepthCounter {
    /// Counter without a limit (encoding)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Counter that fails beyond `max` nested composites (decoding)
    pub fn bounded(max: usize) -> Self {
        Self {
            state: Rc::default(),
            max: Some(max),
        }
    }

    pub fn enter(&self) -> BerResult<DepthGuard> {
        let next = self.state.current.get() + 1;
        if let Some(max) = self.max {
            if next > max {
                return Err(BerError::DepthExceeded(max));
            }
        }
        self.state.current.set(next);
        if next > self.state.peak.get() {
            self.state.peak.set(next);
        }
        log::trace!("Entered composite at depth {}", next);
        Ok(DepthGuard {
            state: Rc::clone(&self.state),
        })
    }

    pub fn current(&self) -> usize {
        self.state.current.get()
    }

    /// Deepest nesting reached so far
    pub fn peak(&self) -> usize {
        self.state.peak.get()
    }

    /// Remaining budget for scanning indefinite-length input
    ///
    /// Each composite level may add a member wrapper on the wire, and a
    /// segmented string one more level at the bottom.
    pub fn nesting_limit(&self) -> NestingLimit {
        match self.max {
            Some(max) => NestingLimit {
                depth: self.current().saturating_mul(2),
                max: max.saturating_mul(2).saturating_add(1),
                configured: max,
            },
            None => NestingLimit {
                depth: self.current(),
                ..NestingLimit::new(usize::MAX)
            },
        }
    }
}

/// Scope of one composite; leaving it decrements the counter
#[derive(Debug)]
#[must_use]
pub struct DepthGuard {
    state: Rc<DepthState>,
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        let current = self.state.current.get();
        self.state.current.set(current.saturating_sub(1));
    }
}
