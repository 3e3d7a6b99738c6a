//! Transfer deadlines
//!
//! Blocking reads check a [`Deadline`] once per poll step. [`NoDeadline`]
//! keeps the infinite-patience behaviour; [`PollBudget`] bounds the number of
//! poll steps and works without a clock; [`Until`] (std only) compares
//! against a monotonic [`std::time::Instant`].

/// A point after which a blocking transfer gives up
pub trait Deadline {
    /// Returns true once the deadline has passed
    ///
    /// Called once per poll step that made no final progress.
    fn expired(&mut self) -> bool;
}

/// Never expires; the transfer blocks until the peer clocks every frame
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeadline;

impl Deadline for NoDeadline {
    #[inline]
    fn expired(&mut self) -> bool {
        false
    }
}

/// Expires after a fixed number of poll steps
#[derive(Debug, Clone, Copy)]
pub struct PollBudget(pub u32);

impl Deadline for PollBudget {
    fn expired(&mut self) -> bool {
        if self.0 == 0 {
            return true;
        }
        self.0 -= 1;
        false
    }
}

/// `None` never expires
impl<D: Deadline> Deadline for Option<D> {
    fn expired(&mut self) -> bool {
        self.as_mut().is_some_and(|d| d.expired())
    }
}

impl<D: Deadline + ?Sized> Deadline for &mut D {
    fn expired(&mut self) -> bool {
        (**self).expired()
    }
}

/// Expires at a monotonic instant
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct Until(pub std::time::Instant);

#[cfg(feature = "std")]
impl Until {
    /// Deadline `timeout` from now
    pub fn after(timeout: std::time::Duration) -> Self {
        Self(std::time::Instant::now() + timeout)
    }
}

#[cfg(feature = "std")]
impl Deadline for Until {
    fn expired(&mut self) -> bool {
        std::time::Instant::now() >= self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_budget() {
        let mut budget = PollBudget(2);
        assert!(!budget.expired());
        assert!(!budget.expired());
        assert!(budget.expired());
        assert!(budget.expired());
    }

    #[test]
    fn test_optional_deadline() {
        let mut none: Option<PollBudget> = None;
        assert!(!none.expired());
        let mut some = Some(PollBudget(0));
        assert!(some.expired());
    }

    #[test]
    fn test_no_deadline() {
        let mut d = NoDeadline;
        assert!((0..1000).all(|_| !d.expired()));
    }
}
