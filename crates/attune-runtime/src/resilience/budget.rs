//! Per-run fallback-research budget.
//!
//! Fallback lookups hit an external search service, so one run gets a
//! fixed allowance. When the allowance is spent, further missing-tempo
//! tracks are treated as unresearchable and reject on insufficient
//! confidence rather than queuing more external calls.
//!
//! The orchestrator spends the run's allowance in candidate order before
//! the verification fan-out, then hands each verification its own slice.
//! Outcomes therefore never depend on pool width or task timing.

use parking_lot::Mutex;

/// Counts fallback lookups for one run against a fixed cap.
pub struct ResearchBudget {
    used: Mutex<u32>,
    max_lookups: u32,
}

impl ResearchBudget {
    /// Create a budget allowing `max_lookups` external lookups.
    pub fn new(max_lookups: u32) -> Self {
        Self {
            used: Mutex::new(0),
            max_lookups,
        }
    }

    /// Try to reserve one lookup. Returns false when the budget is spent.
    pub fn try_acquire(&self) -> bool {
        let mut used = self.used.lock();
        if *used >= self.max_lookups {
            return false;
        }
        *used += 1;
        true
    }

    /// Lookups consumed so far.
    pub fn used(&self) -> u32 {
        *self.used.lock()
    }

    /// The configured cap.
    pub fn max_lookups(&self) -> u32 {
        self.max_lookups
    }
}
