//! Microsecond time budget shared by the sub-operations of one exchange.

use std::time::{Duration, Instant};

use crate::error::Error;

/// A signed countdown of microseconds.
///
/// Every blocking step charges its wall-clock time with
/// [`measure`](Budget::measure). The countdown may go negative; once it is at
/// or below zero, [`check`](Budget::check) fails with [`Error::Timeout`]
/// instead of retrying with a zero timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    remaining_us: i64,
    allotted: Duration,
}

impl Budget {
    pub fn new(allotted: Duration) -> Self {
        Self {
            remaining_us: i64::try_from(allotted.as_micros()).unwrap_or(i64::MAX),
            allotted,
        }
    }

    pub fn from_micros(us: i64) -> Self {
        Self {
            remaining_us: us,
            allotted: Duration::from_micros(us.max(0) as u64),
        }
    }

    /// The amount this budget started with.
    pub fn allotted(&self) -> Duration {
        self.allotted
    }

    pub fn remaining_micros(&self) -> i64 {
        self.remaining_us
    }

    /// Remaining time, saturating at zero.
    pub fn remaining(&self) -> Duration {
        Duration::from_micros(self.remaining_us.max(0) as u64)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_us <= 0
    }

    pub fn charge(&mut self, elapsed: Duration) {
        let us = i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX);
        self.remaining_us = self.remaining_us.saturating_sub(us);
    }

    /// Run one blocking step against this budget and charge its duration.
    pub fn measure<R>(&mut self, f: impl FnOnce(&Budget) -> R) -> R {
        let start = Instant::now();
        let result = f(self);
        self.charge(start.elapsed());
        result
    }

    /// Fail with a timeout for `operation` if nothing is left.
    pub fn check(&self, operation: &'static str) -> Result<(), Error> {
        if self.is_exhausted() {
            return Err(self.timeout(operation));
        }
        Ok(())
    }

    pub fn timeout(&self, operation: &'static str) -> Error {
        Error::Timeout {
            operation,
            budget: self.allotted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_goes_negative() {
        let mut budget = Budget::new(Duration::from_micros(100));
        assert_eq!(budget.remaining_micros(), 100);
        budget.charge(Duration::from_micros(40));
        assert_eq!(budget.remaining_micros(), 60);
        assert!(!budget.is_exhausted());

        budget.charge(Duration::from_micros(70));
        assert_eq!(budget.remaining_micros(), -10);
        assert_eq!(budget.remaining(), Duration::ZERO);
        assert!(budget.is_exhausted());
        assert_eq!(budget.allotted(), Duration::from_micros(100));
    }

    #[test]
    fn check_reports_operation() {
        let budget = Budget::from_micros(0);
        match budget.check("connect") {
            Err(Error::Timeout { operation, .. }) => assert_eq!(operation, "connect"),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(Budget::from_micros(1).check("connect").is_ok());
    }

    #[test]
    fn measure_charges_elapsed() {
        let mut budget = Budget::new(Duration::from_secs(1));
        let value = budget.measure(|b| {
            assert!(!b.is_exhausted());
            std::thread::sleep(Duration::from_millis(5));
            7
        });
        assert_eq!(value, 7);
        assert!(budget.remaining() <= Duration::from_millis(995));
    }
}
