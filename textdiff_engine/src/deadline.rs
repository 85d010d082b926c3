use std::cell::Cell;
use std::time::{Duration, Instant};

/// Explicit computation budget polled at algorithm checkpoints.
///
/// A deadline is created once per top-level diff call and threaded through
/// every algorithm by reference. Checkpoints call [`Deadline::is_valid`];
/// once it returns `false` the running algorithm stops expanding and returns
/// a coarser, still valid, result.
#[derive(Debug, Clone)]
pub enum Deadline {
    /// Never expires.
    Unbounded,
    /// Expires at a fixed instant.
    At(Instant),
    /// Expires after a fixed number of successful checkpoints.
    Checkpoints(Cell<usize>),
}

impl Deadline {
    /// Budget of `millis` milliseconds from now; 0 means unbounded.
    pub fn from_millis(millis: u64) -> Self {
        if millis == 0 {
            return Deadline::Unbounded;
        }
        Deadline::At(Instant::now() + Duration::from_millis(millis))
    }

    /// Budget that allows exactly `count` checkpoints to pass.
    pub fn after_checkpoints(count: usize) -> Self {
        Deadline::Checkpoints(Cell::new(count))
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Deadline::Unbounded)
    }

    /// Poll the budget; `false` once exhausted.
    pub fn is_valid(&self) -> bool {
        match self {
            Deadline::Unbounded => true,
            Deadline::At(instant) => Instant::now() < *instant,
            Deadline::Checkpoints(remaining) => match remaining.get() {
                0 => false,
                n => {
                    remaining.set(n - 1);
                    true
                }
            },
        }
    }

    /// The tighter of `self` and a fresh budget of `cap_ms` milliseconds.
    ///
    /// An unbounded deadline stays unbounded and a cap of 0 changes nothing.
    pub fn capped(&self, cap_ms: u64) -> Self {
        match self {
            Deadline::Unbounded => Deadline::Unbounded,
            Deadline::At(instant) if cap_ms > 0 => {
                let cap = Instant::now() + Duration::from_millis(cap_ms);
                Deadline::At((*instant).min(cap))
            }
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_millis_is_unbounded() {
        let deadline = Deadline::from_millis(0);
        assert!(deadline.is_unbounded());
        assert!(deadline.is_valid());
    }

    #[test]
    fn checkpoint_budget_runs_out() {
        let deadline = Deadline::after_checkpoints(2);
        assert!(deadline.is_valid());
        assert!(deadline.is_valid());
        assert!(!deadline.is_valid());
        assert!(!deadline.is_valid());
    }

    #[test]
    fn past_instant_is_exhausted() {
        let deadline = Deadline::At(Instant::now() - Duration::from_millis(1));
        assert!(!deadline.is_valid());
    }

    #[test]
    fn capping_never_extends_a_deadline() {
        let soon = Instant::now() + Duration::from_millis(10);
        match Deadline::At(soon).capped(60_000) {
            Deadline::At(instant) => assert_eq!(instant, soon),
            other => panic!("expected an instant deadline, got {other:?}"),
        }
        assert!(Deadline::Unbounded.capped(10).is_unbounded());
    }
}
